//! # Block Rendering
//!
//! Per-kind dialplan lines. Plain blocks render one line; switch blocks
//! render a header line followed by one conditional jump per case target.
//! The default target is not jumped to: the branch compiler emits it
//! directly after the switch, so control falls through into it.

use crate::model::{Block, BlockKind};

impl Block {
    /// Render a non-switch block.
    pub fn render(&self) -> String {
        self.emit(&[], None)
    }

    /// Render a switch block with its case targets in resolved order.
    pub fn render_switch(&self, cases: &[&Block]) -> String {
        self.emit(cases, None)
    }

    /// Render a host-dependent switch block.
    pub fn render_switch_with_host(&self, cases: &[&Block], fast_agi_host: &str) -> String {
        self.emit(cases, Some(fast_agi_host))
    }

    /// `n(<label>)`, or bare `n` for unlabelled blocks.
    fn priority(&self) -> String {
        if self.label.is_empty() {
            "n".to_string()
        } else {
            format!("n({})", self.label)
        }
    }

    fn line(&self, application: &str, arguments: &str) -> String {
        format!("\tsame = {},{}({})\n", self.priority(), application, arguments)
    }

    fn emit(&self, cases: &[&Block], fast_agi_host: Option<&str>) -> String {
        match &self.kind {
            BlockKind::Start => self.line("NoOp", "Start"),
            BlockKind::Answer => self.line("Answer", ""),
            BlockKind::Playback { file } => self.line("Playback", file),
            BlockKind::Background { file } => self.line("Background", file),
            BlockKind::Wait { seconds } => self.line("Wait", &seconds.to_string()),
            BlockKind::SetVariable { name, value } => {
                self.line("Set", &format!("{}={}", name, value))
            }
            BlockKind::Dial { destination, timeout } => match timeout {
                Some(timeout) => self.line("Dial", &format!("{},{}", destination, timeout)),
                None => self.line("Dial", destination),
            },
            BlockKind::Queue { name } => self.line("Queue", name),
            BlockKind::Custom { application, arguments } => self.line(application, arguments),
            BlockKind::Switch { expression } => {
                let mut code = self.line("NoOp", &format!("Switch {}", expression));
                push_value_jumps(&mut code, expression, cases);
                code
            }
            BlockKind::TimeSwitch => {
                let mut code = self.line("NoOp", "TimeSwitch");
                for case in cases {
                    code.push_str(&format!(
                        "\tsame = n,GotoIfTime({}?{})\n",
                        case_value(case),
                        case.label
                    ));
                }
                code
            }
            BlockKind::AgiSwitch { script } => {
                let mut code = match fast_agi_host {
                    Some(host) => self.line("AGI", &format!("agi://{}/{}", host, script)),
                    None => self.line("AGI", script),
                };
                push_value_jumps(&mut code, "${AGI_RESULT}", cases);
                code
            }
            BlockKind::Case { value } => self.line("NoOp", &format!("Case {}", value)),
            BlockKind::FalseCase => self.line("NoOp", "Default"),
        }
    }
}

/// One `GotoIf` per case comparing `expression` with the case value.
fn push_value_jumps(code: &mut String, expression: &str, cases: &[&Block]) {
    for case in cases {
        code.push_str(&format!(
            "\tsame = n,GotoIf($[\"{}\" = \"{}\"]?{})\n",
            expression,
            case_value(case),
            case.label
        ));
    }
}

fn case_value(block: &Block) -> &str {
    match &block.kind {
        BlockKind::Case { value } => value,
        _ => "",
    }
}
