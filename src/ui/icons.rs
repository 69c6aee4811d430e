//! Shared status glyphs, with plain-text fallbacks for terminals without
//! emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static KEY: Emoji<'_, '_> = Emoji("🔑 ", "[AUTH]");
pub static HOURGLASS: Emoji<'_, '_> = Emoji("⏳ ", "[...]");

// View indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static ISSUE: Emoji<'_, '_> = Emoji("🐛 ", "-");
pub static STAR: Emoji<'_, '_> = Emoji("⭐ ", "*");
pub static EMPTY: Emoji<'_, '_> = Emoji("🫙 ", "");
