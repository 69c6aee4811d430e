//! Plain-text rendering of coordinator state for the CLI.

use std::fmt::Write;

use console::style;
use triage_common::{Category, Issue, RepositoryName};

use crate::coordinator::{CommandOutput, Notice};
use crate::reconcile::TriageView;

use super::icons::{CHECK, CROSS, EMPTY, FOLDER, ISSUE, KEY, STAR, WARN};

pub fn repositories(names: &[&RepositoryName]) -> String {
    let mut out = String::new();
    for name in names {
        let _ = writeln!(out, "{}{}", FOLDER, name);
    }
    out
}

fn issue_line(out: &mut String, indent: &str, issue: &Issue) {
    let _ = writeln!(
        out,
        "{}{}{} {}",
        indent,
        ISSUE,
        style(format!("#{}", issue.number)).dim(),
        issue.title
    );
}

fn issue_list(out: &mut String, indent: &str, issues: &[Issue]) {
    if issues.is_empty() {
        let _ = writeln!(out, "{}{}{}", indent, EMPTY, style("(none)").dim());
    }
    for issue in issues {
        issue_line(out, indent, issue);
    }
}

/// Renders a whole view, or one category of a categorized view.
pub fn view(view: &TriageView, only: Option<Category>) -> String {
    let mut out = String::new();
    match view {
        TriageView::Flat(issues) | TriageView::Prioritized(issues) => {
            issue_list(&mut out, "", issues);
        }
        TriageView::Categorized { groups, remainder } => {
            for (category, issues) in groups {
                if only.is_some_and(|selected| selected != *category) {
                    continue;
                }
                let _ = writeln!(out, "{} ({})", style(category).bold(), issues.len());
                issue_list(&mut out, "  ", issues);
            }
            if let (None, Some(rest)) = (only, remainder) {
                let _ = writeln!(out, "{} ({})", style("Uncategorized").bold(), rest.len());
                issue_list(&mut out, "  ", rest);
            }
        }
        TriageView::Important {
            important,
            remaining,
        } => {
            let _ = writeln!(out, "{}{}", STAR, style("Important").bold());
            issue_list(&mut out, "  ", important);
            let _ = writeln!(out, "{}", style("Remaining").bold());
            issue_list(&mut out, "  ", remaining);
        }
    }
    out
}

pub fn issue_detail(repository: &RepositoryName, issue: &Issue) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        style(format!("{}#{}", repository, issue.number)).bold(),
        issue.title
    );
    if let Some(body) = issue.body.as_deref().filter(|body| !body.trim().is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", body);
    }
    out
}

pub fn command_output(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Succeeded(text) => format!("{}{}", CHECK, text),
        CommandOutput::Failed(text) => format!("{}{}", CROSS, style(text).red()),
    }
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::LoginRequired => format!("{}{}", KEY, notice),
        Notice::NoRepositories | Notice::NoIssues => format!("{}{}", EMPTY, notice),
        _ => format!("{}{}", WARN, style(notice).yellow()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn issue(number: i64, title: &str) -> Issue {
        Issue {
            id: None,
            number,
            title: title.to_string(),
            body: None,
        }
    }

    fn categorized() -> TriageView {
        let mut groups = BTreeMap::new();
        groups.insert(Category::Major, vec![issue(3, "crash on save")]);
        groups.insert(Category::Minor, vec![issue(2, "typo")]);
        groups.insert(Category::Bug, vec![]);
        TriageView::Categorized {
            groups,
            remainder: Some(vec![issue(1, "fix login")]),
        }
    }

    #[test]
    fn test_categorized_view_lists_groups_in_order() {
        console::set_colors_enabled(false);
        let text = view(&categorized(), None);

        let major = text.find("Major").unwrap();
        let minor = text.find("Minor").unwrap();
        let bug = text.find("Bug").unwrap();
        let rest = text.find("Uncategorized").unwrap();
        assert!(major < minor && minor < bug && bug < rest);
        assert!(text.contains("#3"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn test_single_category_hides_others() {
        console::set_colors_enabled(false);
        let text = view(&categorized(), Some(Category::Minor));

        assert!(text.contains("typo"));
        assert!(!text.contains("crash on save"));
        assert!(!text.contains("Uncategorized"));
    }

    #[test]
    fn test_important_view_has_both_groups() {
        console::set_colors_enabled(false);
        let text = view(
            &TriageView::Important {
                important: vec![issue(3, "crash on save")],
                remaining: vec![issue(2, "typo")],
            },
            None,
        );
        assert!(text.find("Important").unwrap() < text.find("Remaining").unwrap());
        assert!(text.contains("typo"));
    }

    #[test]
    fn test_issue_detail_includes_body() {
        let mut detail = issue(7, "crash");
        detail.body = Some("steps to reproduce".to_string());
        let text = issue_detail(&"octo/app".into(), &detail);
        assert!(text.contains("octo/app#7"));
        assert!(text.contains("steps to reproduce"));
    }

    #[test]
    fn test_command_failure_keeps_text() {
        let text = command_output(&CommandOutput::Failed("backend down".to_string()));
        assert!(text.contains("backend down"));
    }
}
