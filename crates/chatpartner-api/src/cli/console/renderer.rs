//! Terminal rendering of replies with syntax-highlighted code blocks.
//!
//! `ReplyRenderer` combines `termimad` for prose and `syntect` for fenced
//! code blocks.

use console::style;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;

const THEME: &str = "base16-ocean.dark";

/// Width of the line printed between turns.
const SEPARATOR_WIDTH: usize = 80;

/// Terminal renderer for bot replies.
pub struct ReplyRenderer {
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl ReplyRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(THEME).unwrap_or_default();

        Self {
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Render a reply. Code fences are highlighted by their language tag
    /// (plain text when missing or unknown); everything else goes through
    /// termimad.
    pub fn render(&self, reply: &str) -> String {
        let mut output = String::new();
        let mut code_lang: Option<String> = None;
        let mut code_buf = String::new();

        for line in reply.lines() {
            match (&code_lang, line.trim_start().starts_with("```")) {
                (None, true) => {
                    code_lang = Some(line.trim_start().trim_start_matches('`').trim().to_string());
                    code_buf.clear();
                }
                (Some(lang), true) => {
                    output.push_str(&self.highlight_code(&code_buf, lang));
                    code_lang = None;
                }
                (Some(_), false) => {
                    code_buf.push_str(line);
                    code_buf.push('\n');
                }
                (None, false) => {
                    output.push_str(&self.skin.term_text(line).to_string());
                }
            }
        }

        // Unclosed fence
        if let Some(lang) = &code_lang {
            output.push_str(&self.highlight_code(&code_buf, lang));
        }

        output
    }

    /// Green line of asterisks between turns.
    pub fn separator(&self) -> String {
        style("*".repeat(SEPARATOR_WIDTH)).green().to_string()
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut h = HighlightLines::new(syntax, &self.theme);

        let mut output = String::new();
        output.push_str(&format!("{}\n", style(format!("--- {lang} ---")).dim()));

        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("{escaped}\x1b[0m\n"));
        }

        output
    }
}
