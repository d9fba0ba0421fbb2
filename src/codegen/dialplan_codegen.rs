//! # Dialplan Code Generator
//!
//! Walks a script graph and emits its extension body, then stitches
//! extension bodies together under their context headers.

use crate::compiler::CompileContext;
use crate::error::{DialplanError, Result};
use crate::model::{Block, Context, LocalId, Script};
use std::collections::HashSet;

/// Emitted when a walk reaches a block that was already rendered
fn goto_line(label: &str) -> String {
    format!("\tsame = n,Goto({})\n", label)
}

/// Emitted when a branch ends without a successor
const HANGUP_LINE: &str = "\tsame = n,Hangup()\n";

/// Branch compiler for a single script.
///
/// `visited` and `pending` live for one script only; every extension gets a
/// fresh generator.
pub struct ScriptCodeGenerator<'a> {
    script: &'a Script,
    context: &'a CompileContext,
    visited: HashSet<LocalId>,
    pending: Vec<&'a Block>,
}

impl<'a> ScriptCodeGenerator<'a> {
    pub fn new(script: &'a Script, context: &'a CompileContext) -> Self {
        Self {
            script,
            context,
            visited: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Generate the body of the script starting from its `Start` block.
    pub fn generate(self) -> Result<String> {
        let script = self.script;
        let start = script
            .start_block()
            .ok_or(DialplanError::StartBlockNotFound)?;
        self.generate_from(start)
    }

    /// Generate the body reachable from `entry`.
    ///
    /// Branch starts are popped LIFO; a switch pushes its cases and then its
    /// default target, so the default is compiled right after the switch.
    pub fn generate_from(mut self, entry: &'a Block) -> Result<String> {
        let mut code = String::new();
        self.pending.push(entry);

        while let Some(branch_start) = self.pending.pop() {
            tracing::debug!(
                "[CODEGEN] Script {}: branch from block {} ({})",
                self.script.id,
                branch_start.local_id,
                branch_start.label
            );
            self.generate_branch(branch_start, &mut code)?;
        }

        Ok(code)
    }

    fn generate_branch(&mut self, start: &'a Block, code: &mut String) -> Result<()> {
        let mut current = Some(start);

        while let Some(block) = current {
            if self.visited.contains(&block.local_id) {
                code.push_str(&goto_line(&block.label));
                return Ok(());
            }
            if block.is_switcher() {
                return self.generate_switch(block, code);
            }
            code.push_str(&block.render());
            self.visited.insert(block.local_id);
            current = self.next_block(block)?;
        }

        code.push_str(HANGUP_LINE);
        Ok(())
    }

    fn generate_switch(&mut self, switch: &'a Block, code: &mut String) -> Result<()> {
        let mut cases = Vec::new();
        let mut default = None;

        let script = self.script;
        for connection in script.outgoing(switch.local_id) {
            let target = self.find_block(connection.target_local_id)?;
            if target.is_case() {
                cases.push(target);
            } else if target.is_false_case() && default.is_none() {
                default = Some(target);
            }
        }

        let default = default.ok_or(DialplanError::DefaultCaseNotFound(switch.local_id))?;

        if switch.is_host_dependent() {
            code.push_str(&switch.render_switch_with_host(&cases, &self.context.fast_agi_host));
        } else {
            code.push_str(&switch.render_switch(&cases));
        }
        self.visited.insert(switch.local_id);

        tracing::debug!(
            "[CODEGEN] Switch {} resolved {} case(s), default {}",
            switch.local_id,
            cases.len(),
            default.local_id
        );

        self.pending.extend(cases);
        self.pending.push(default);
        Ok(())
    }

    /// Target of the first connection leaving `block`, if any.
    fn next_block(&self, block: &Block) -> Result<Option<&'a Block>> {
        match self.script.outgoing(block.local_id).next() {
            Some(connection) => self.find_block(connection.target_local_id).map(Some),
            None => Ok(None),
        }
    }

    fn find_block(&self, local_id: LocalId) -> Result<&'a Block> {
        self.script
            .block(local_id)
            .ok_or(DialplanError::BlockNotFound(local_id))
    }
}

/// Render every context with its extensions.
///
/// Extensions carrying a script are compiled from their `Start` block. Any
/// failure aborts the whole assembly.
pub fn assemble_contexts(contexts: &[Context], context: &CompileContext) -> Result<String> {
    let mut code = String::new();

    for dialplan_context in contexts {
        code.push_str(&format!("[{}]\n", dialplan_context.name));

        for extension in &dialplan_context.extensions {
            code.push_str(&format!("exten = {},1,NoOp()\n", extension.name));

            if let Some(script) = &extension.script {
                let body = ScriptCodeGenerator::new(script, context).generate()?;
                code.push_str(&body);
            }
        }
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, Extension};

    fn compile(script: &Script) -> Result<String> {
        let context = CompileContext::new("127.0.0.1");
        ScriptCodeGenerator::new(script, &context).generate()
    }

    fn answer_chain() -> Script {
        Script::new(1, "answer")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "b", BlockKind::Answer)
            .with_connection(1, 2)
    }

    #[test]
    fn test_linear_chain_ends_with_hangup() {
        let script = answer_chain();
        let start = script.block(1).unwrap().render();
        let answer = script.block(2).unwrap().render();

        let code = compile(&script).unwrap();
        assert_eq!(code, format!("{}{}{}", start, answer, HANGUP_LINE));
    }

    #[test]
    fn test_lone_start_block() {
        let script = Script::new(1, "empty").with_block(1, "s", BlockKind::Start);
        assert_eq!(
            compile(&script).unwrap(),
            "\tsame = n(s),NoOp(Start)\n\tsame = n,Hangup()\n"
        );
    }

    #[test]
    fn test_cycle_becomes_goto() {
        let script = Script::new(2, "loop")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "b", BlockKind::Playback { file: "welcome".into() })
            .with_block(3, "c", BlockKind::Wait { seconds: 1 })
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(3, 2);

        let code = compile(&script).unwrap();
        assert_eq!(
            code,
            "\tsame = n(s),NoOp(Start)\n\
             \tsame = n(b),Playback(welcome)\n\
             \tsame = n(c),Wait(1)\n\
             \tsame = n,Goto(b)\n"
        );
        assert_eq!(code.matches("Playback(welcome)").count(), 1);
        assert!(!code.contains("Hangup"));
    }

    #[test]
    fn test_switch_branch_order() {
        let script = Script::new(3, "menu")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "sw", BlockKind::Switch { expression: "${EXTEN}".into() })
            .with_block(3, "t1", BlockKind::Case { value: "1".into() })
            .with_block(4, "t2", BlockKind::Case { value: "2".into() })
            .with_block(5, "f", BlockKind::FalseCase)
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4)
            .with_connection(2, 5);

        let code = compile(&script).unwrap();

        let switch_at = code.find("NoOp(Switch").unwrap();
        let default_at = code.find("n(f),NoOp(Default)").unwrap();
        let t2_at = code.find("n(t2),NoOp(Case 2)").unwrap();
        let t1_at = code.find("n(t1),NoOp(Case 1)").unwrap();
        assert!(switch_at < default_at);
        assert!(default_at < t2_at);
        assert!(t2_at < t1_at);

        // each case branch and the default hang up on their own
        assert_eq!(code.matches("Hangup()").count(), 3);
        // jumps are emitted in connection order
        assert!(code.find("?t1)").unwrap() < code.find("?t2)").unwrap());
    }

    #[test]
    fn test_switch_without_default_fails() {
        let script = Script::new(4, "broken")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "sw", BlockKind::Switch { expression: "${X}".into() })
            .with_block(3, "c", BlockKind::Case { value: "1".into() })
            .with_connection(1, 2)
            .with_connection(2, 3);

        let err = compile(&script).unwrap_err();
        assert!(matches!(err, DialplanError::DefaultCaseNotFound(2)));
    }

    #[test]
    fn test_missing_start_block() {
        let script = Script::new(5, "headless").with_block(2, "b", BlockKind::Answer);
        assert!(matches!(compile(&script), Err(DialplanError::StartBlockNotFound)));
    }

    #[test]
    fn test_dangling_connection() {
        let script = Script::new(6, "dangling")
            .with_block(1, "s", BlockKind::Start)
            .with_connection(1, 42);
        assert!(matches!(compile(&script), Err(DialplanError::BlockNotFound(42))));
    }

    #[test]
    fn test_first_connection_wins() {
        let script = Script::new(7, "fork")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "a", BlockKind::Answer)
            .with_block(3, "q", BlockKind::Queue { name: "sales".into() })
            .with_connection(1, 2)
            .with_connection(1, 3);

        let code = compile(&script).unwrap();
        assert!(code.contains("Answer()"));
        assert!(!code.contains("Queue(sales)"));
    }

    #[test]
    fn test_case_branch_back_into_switch() {
        // retry loop: case 9 jumps back to the switch
        let script = Script::new(8, "retry")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "menu", BlockKind::Switch { expression: "${DIGIT}".into() })
            .with_block(3, "again", BlockKind::Case { value: "9".into() })
            .with_block(4, "other", BlockKind::FalseCase)
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4)
            .with_connection(3, 2);

        let code = compile(&script).unwrap();
        assert!(code.ends_with("\tsame = n(again),NoOp(Case 9)\n\tsame = n,Goto(menu)\n"));
        assert_eq!(code.matches("NoOp(Switch").count(), 1);
    }

    #[test]
    fn test_host_threaded_into_agi_switch() {
        let script = Script::new(9, "agi")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "lookup", BlockKind::AgiSwitch { script: "crm".into() })
            .with_block(3, "vip", BlockKind::Case { value: "VIP".into() })
            .with_block(4, "rest", BlockKind::FalseCase)
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4);

        let context = CompileContext::new("192.168.1.20");
        let code = ScriptCodeGenerator::new(&script, &context).generate().unwrap();
        assert!(code.contains("AGI(agi://192.168.1.20/crm)"));
    }

    #[test]
    fn test_deterministic_output() {
        let script = Script::new(10, "loop")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "sw", BlockKind::TimeSwitch)
            .with_block(3, "day", BlockKind::Case { value: "08:00-20:00,*,*,*".into() })
            .with_block(4, "night", BlockKind::FalseCase)
            .with_block(
                5,
                "dial",
                BlockKind::Dial { destination: "SIP/ops".into(), timeout: Some(30) },
            )
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4)
            .with_connection(3, 5)
            .with_connection(4, 5);

        assert_eq!(compile(&script).unwrap(), compile(&script).unwrap());
    }

    fn switch_with_mixed_targets() -> Script {
        Script::new(11, "mixed")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "sw", BlockKind::Switch { expression: "X".into() })
            .with_block(3, "a", BlockKind::Answer)
            .with_block(4, "f1", BlockKind::FalseCase)
            .with_block(5, "f2", BlockKind::FalseCase)
            .with_block(6, "c", BlockKind::Case { value: "1".into() })
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4)
            .with_connection(2, 5)
            .with_connection(2, 6)
            .with_connection(6, 2)
    }

    #[test]
    fn test_switch_ignores_non_case_targets() {
        let code = compile(&switch_with_mixed_targets()).unwrap();

        assert_eq!(code.matches("GotoIf").count(), 1);
        assert!(code.contains("\tsame = n,GotoIf($[\"X\" = \"1\"]?c)\n"));
        assert!(!code.contains("Answer()"));
        assert!(!code.contains("n(a)"));
    }

    #[test]
    fn test_first_false_case_is_default() {
        let code = compile(&switch_with_mixed_targets()).unwrap();
        assert_eq!(
            code,
            "\tsame = n(s),NoOp(Start)\n\
             \tsame = n(sw),NoOp(Switch X)\n\
             \tsame = n,GotoIf($[\"X\" = \"1\"]?c)\n\
             \tsame = n(f1),NoOp(Default)\n\
             \tsame = n,Hangup()\n\
             \tsame = n(c),NoOp(Case 1)\n\
             \tsame = n,Goto(sw)\n"
        );
        assert!(!code.contains("n(f2)"));
    }

    #[test]
    fn test_switch_dangling_target() {
        let script = Script::new(12, "dangling switch")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "sw", BlockKind::Switch { expression: "X".into() })
            .with_block(3, "f", BlockKind::FalseCase)
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 42);

        assert!(matches!(compile(&script), Err(DialplanError::BlockNotFound(42))));
    }

    #[test]
    fn test_case_shared_by_two_switches() {
        let script = Script::new(13, "shared")
            .with_block(1, "s", BlockKind::Start)
            .with_block(2, "s1", BlockKind::Switch { expression: "A".into() })
            .with_block(3, "c", BlockKind::Case { value: "1".into() })
            .with_block(4, "d1", BlockKind::FalseCase)
            .with_block(5, "s2", BlockKind::Switch { expression: "B".into() })
            .with_block(6, "d2", BlockKind::FalseCase)
            .with_connection(1, 2)
            .with_connection(2, 3)
            .with_connection(2, 4)
            .with_connection(4, 5)
            .with_connection(5, 3)
            .with_connection(5, 6);

        assert_eq!(
            compile(&script).unwrap(),
            "\tsame = n(s),NoOp(Start)\n\
             \tsame = n(s1),NoOp(Switch A)\n\
             \tsame = n,GotoIf($[\"A\" = \"1\"]?c)\n\
             \tsame = n(d1),NoOp(Default)\n\
             \tsame = n(s2),NoOp(Switch B)\n\
             \tsame = n,GotoIf($[\"B\" = \"1\"]?c)\n\
             \tsame = n(d2),NoOp(Default)\n\
             \tsame = n,Hangup()\n\
             \tsame = n(c),NoOp(Case 1)\n\
             \tsame = n,Hangup()\n\
             \tsame = n,Goto(c)\n"
        );
    }

    #[test]
    fn test_assemble_headers_and_bodies() {
        let contexts = vec![
            Context::new("incoming")
                .with_extension(Extension::new("100").with_script(answer_chain()))
                .with_extension(Extension::new("200")),
            Context::new("empty"),
        ];

        let code = assemble_contexts(&contexts, &CompileContext::new("127.0.0.1")).unwrap();
        assert_eq!(
            code,
            "[incoming]\n\
             exten = 100,1,NoOp()\n\
             \tsame = n(s),NoOp(Start)\n\
             \tsame = n(b),Answer()\n\
             \tsame = n,Hangup()\n\
             exten = 200,1,NoOp()\n\
             [empty]\n"
        );
    }

    #[test]
    fn test_assemble_is_all_or_nothing() {
        let contexts = vec![Context::new("incoming")
            .with_extension(Extension::new("100").with_script(answer_chain()))
            .with_extension(Extension::new("101").with_script(Script::new(2, "no start")))];

        let result = assemble_contexts(&contexts, &CompileContext::new("127.0.0.1"));
        assert!(matches!(result, Err(DialplanError::StartBlockNotFound)));
    }
}
