//! C language binding
//!
//! Emits the full generated-source family for a machine directory:
//! `Machine_<Name>.h/.c`, one `State_<Name>.h/.c` pair per state, the
//! per-transition guard expression files included by the dispatch code, and
//! a CMake build fragment. Arrangements get `Arrangement.h/.c` plus their
//! own build fragment.
//!
//! Symbol discipline (shared with every binding so generated files can
//! cross-reference each other): struct tags keep the sanitized name,
//! function names use the lowercase form, macros and include guards the
//! uppercase form. State arrays follow the machine's canonical state order
//! and transition dispatch evaluates guards in attachment order, returning
//! the first that holds.

use crate::arrangement::Arrangement;
use crate::codegen::{block, delimited, for_each, for_each_indexed, include_guarded, indented};
use crate::error::Result;
use crate::filetree::FileTree;
use crate::fsm::Llfsm;
use crate::machine::Machine;
use crate::names::{lowercased, sanitize_identifier, uppercased};

use super::{EmitOptions, Format, OutputLanguage};

pub struct CBinding;

const FILE_BANNER: &str = "Automatically created using fsmconvert -- do not change manually!";

fn banner(file_name: &str) -> String {
    format!("//\n// {file_name}\n//\n// {FILE_BANNER}\n//\n")
}

fn machine_struct(machine: &str) -> String {
    format!("Machine_{}", sanitize_identifier(machine))
}

fn state_struct(machine: &str, state: &str) -> String {
    format!(
        "FSM{}_State_{}",
        sanitize_identifier(machine),
        sanitize_identifier(state)
    )
}

fn machine_fn(machine: &str, suffix: &str) -> String {
    format!("fsm_{}_{suffix}", lowercased(machine))
}

fn state_fn(machine: &str, state: &str, suffix: &str) -> String {
    format!("fsm_{}_{}_{suffix}", lowercased(machine), lowercased(state))
}

fn macro_prefix(machine: &str) -> String {
    format!("MACHINE_{}", uppercased(machine))
}

impl CBinding {
    fn machine_header(&self, machine: &Machine, options: &EmitOptions) -> String {
        let name = sanitize_identifier(&machine.name);
        let upper = uppercased(&machine.name);
        let mac = macro_prefix(&machine.name);
        let state_count = machine.llfsm.states().len();

        let mut body = String::new();
        body.push_str(&block([
            "#include <inttypes.h>",
            "#include <stdbool.h>",
            &format!("#include \"Machine_{name}_Includes.h\""),
            "",
            "#ifdef INCLUDE_MACHINE_CUSTOM",
            "#include \"Machine_Custom.h\"",
            "#endif",
            "",
            &format!("#ifdef INCLUDE_MACHINE_{upper}_CUSTOM"),
            &format!("#include \"Machine_{name}_Custom.h\""),
            "#endif",
            "",
            &format!("#define {mac}_NUMBER_OF_STATES {state_count}"),
            "",
            &format!(
                "#define {mac}_IS_SUSPENSIBLE {}",
                i32::from(options.suspensible)
            ),
        ]));
        if options.introspectable {
            body.push_str(&format!("\n#define {mac}_IS_INTROSPECTABLE 1\n"));
        }
        body.push_str(&block([
            "",
            "#ifndef RESTART",
            "#define RESTART(m) (((m)->previous_state = (m)->current_state) && ((m)->current_state = (m)->states[0]))",
            "#endif",
            "#ifndef GET_TIME",
            "#define GET_TIME() (machine->state_time + 1)",
            "#endif",
            "#ifndef TAKE_SNAPSHOT",
            "#define TAKE_SNAPSHOT()",
            "#endif",
            "",
            "struct LLFSMArrangement;",
            "struct LLFSMState;",
            "struct LLFSMachine;",
            "",
            &format!("/// A {} LLFSM.", machine.name),
            &format!("struct {}", machine_struct(&machine.name)),
            "{",
        ]));

        let mut fields = block([
            "struct LLFSMState *current_state;",
            "struct LLFSMState *previous_state;",
            "uintptr_t          state_time;",
        ]);
        if options.suspensible {
            fields.push_str(&block([
                "struct LLFSMState *suspend_state;",
                "struct LLFSMState *resume_state;",
            ]));
        }
        fields.push_str(&format!(
            "struct LLFSMState * const states[{mac}_NUMBER_OF_STATES];\n"
        ));
        body.push_str(&indented(&fields, "    "));
        body.push_str(&block([
            "",
            &format!("#   include \"Machine_{name}_Variables.h\""),
            "};",
            "",
        ]));

        if options.introspectable {
            body.push_str(&block([
                &format!("/// Names of the states of a {} LLFSM.", machine.name),
                &format!(
                    "extern const char * const {}[{mac}_NUMBER_OF_STATES];",
                    machine_fn(&machine.name, "state_names")
                ),
                "",
            ]));
        }

        body.push_str(&block([
            &format!("/// Initialise a `{}` LLFSM.", machine_struct(&machine.name)),
            "///",
            "/// - Parameter machine: The LLFSM to initialise.",
            &format!(
                "void {}(struct {} *);",
                machine_fn(&machine.name, "init"),
                machine_struct(&machine.name)
            ),
            "",
            &format!("/// Validate a `{}` LLFSM.", machine_struct(&machine.name)),
            "///",
            "/// - Parameter machine: The LLFSM to validate.",
            &format!(
                "bool {}(struct {} *);",
                machine_fn(&machine.name, "validate"),
                machine_struct(&machine.name)
            ),
        ]));

        let file = format!("Machine_{name}.h");
        format!(
            "{}{}",
            banner(&file),
            include_guarded(&format!("LLFSM_{file}"), &body)
        )
    }

    fn machine_implementation(&self, machine: &Machine, options: &EmitOptions) -> String {
        let name = sanitize_identifier(&machine.name);
        let strukt = machine_struct(&machine.name);
        let fsm = &machine.llfsm;

        let mut init_body = block([
            "machine->current_state = machine->states[0];",
            "machine->previous_state = NULL;",
            "machine->state_time = 0;",
        ]);
        if options.suspensible {
            // Caller contract: a suspend state should be set when requesting
            // suspensibility; a missing one degrades to a NULL sentinel.
            let suspend = fsm
                .suspend_state()
                .and_then(|id| fsm.state_index(id))
                .map(|index| format!("machine->states[{index}]"))
                .unwrap_or_else(|| "NULL".to_string());
            init_body.push_str(&block([
                &format!("machine->suspend_state = {suspend};"),
                "machine->resume_state = NULL;",
            ]));
        }

        let mut out = banner(&format!("Machine_{name}.c"));
        out.push_str(&block([
            &format!("#include \"Machine_{name}.h\""),
            "",
            "#ifndef NULL",
            "#define NULL ((void*)0)",
            "#endif",
            "",
        ]));

        if options.introspectable {
            let names = for_each(fsm.states(), |&id| {
                format!("    \"{}\",", fsm.state_name(id).unwrap_or_default())
            });
            out.push_str(&block([
                &format!("/// Names of the states of a {} LLFSM.", machine.name),
                &format!(
                    "const char * const {}[{}_NUMBER_OF_STATES] =",
                    machine_fn(&machine.name, "state_names"),
                    macro_prefix(&machine.name)
                ),
                "{",
                names.trim_end(),
                "};",
                "",
            ]));
        }

        out.push_str(&block([
            &format!("/// Initialise an instance of `{strukt}`."),
            "///",
            "/// - Parameter machine: The machine to initialise.",
            &format!(
                "void {}(struct {strukt} * const machine)",
                machine_fn(&machine.name, "init")
            ),
        ]));
        out.push_str(&delimited("{", &indented(&init_body, "    "), "}"));
        out.push_str(&block([
            "",
            &format!("/// Validate an instance of `{strukt}`."),
            "///",
            "/// - Parameter machine: The machine to validate.",
            "/// - Returns: `true` iff the machine appears valid.",
            &format!(
                "bool {}(struct {strukt} * const machine)",
                machine_fn(&machine.name, "validate")
            ),
        ]));
        out.push_str(&delimited(
            "{",
            "    return machine->current_state != NULL;",
            "}",
        ));
        out
    }

    fn state_header(&self, machine: &Machine, state_name: &str, options: &EmitOptions) -> String {
        let m_name = sanitize_identifier(&machine.name);
        let s_name = sanitize_identifier(state_name);
        let strukt = state_struct(&machine.name, state_name);
        let m_struct = machine_struct(&machine.name);
        let transitions = machine
            .llfsm
            .state_named(state_name)
            .map(|id| machine.llfsm.transitions_from(id).len())
            .unwrap_or(0);

        let mut body = block([
            "#include <stdbool.h>",
            &format!("#include \"Machine_{m_name}_Includes.h\""),
            &format!("#include \"State_{s_name}_Includes.h\""),
            "",
            "#ifndef NULL",
            "#define NULL ((void*)0)",
            "#endif",
            "",
            &format!(
                "#define {}_NUMBER_OF_TRANSITIONS {transitions}",
                macro_prefix(&machine.name)
            ),
            "",
            &format!("struct {strukt}"),
            "{",
        ]);

        let mut fields = block([
            "struct LLFSMState *(*check_transitions)(const struct LLFSMachine *, const struct LLFSMState *);",
            "void (*on_entry)(struct LLFSMachine *, struct LLFSMState *);",
            "void (*on_exit) (struct LLFSMachine *, struct LLFSMState *);",
            "void (*internal)(struct LLFSMachine *, struct LLFSMState *);",
        ]);
        if options.suspensible {
            fields.push_str(&block([
                "void (*on_suspend)(struct LLFSMachine *, struct LLFSMState *);",
                "void (*on_resume) (struct LLFSMachine *, struct LLFSMState *);",
            ]));
        }
        body.push_str(&indented(&fields, "    "));
        body.push_str(&block([
            "",
            &format!("#   include \"State_{s_name}_Variables.h\""),
            "};",
            "",
        ]));

        let mut declarations = vec![
            (
                format!(
                    "void {}(struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "init")
                ),
                format!("/// Initialise the given {state_name} state."),
            ),
            (
                format!(
                    "bool {}(const struct {m_struct} * const machine, const struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "validate")
                ),
                format!("/// Validate the given {state_name} state."),
            ),
            (
                format!(
                    "struct LLFSMState *{}(const struct {m_struct} * const machine, const struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "check_transitions")
                ),
                format!("/// Check the sequence of transitions for {state_name}."),
            ),
            (
                format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "on_entry")
                ),
                format!("/// The onEntry function for {state_name}."),
            ),
            (
                format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "on_exit")
                ),
                format!("/// The onExit function for {state_name}."),
            ),
            (
                format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "internal")
                ),
                format!("/// The internal action for {state_name}."),
            ),
        ];
        if options.suspensible {
            declarations.push((
                format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "on_suspend")
                ),
                format!("/// The onSuspend function for {state_name}."),
            ));
            declarations.push((
                format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state);",
                    state_fn(&machine.name, state_name, "on_resume")
                ),
                format!("/// The onResume function for {state_name}."),
            ));
        }
        for (declaration, doc) in &declarations {
            body.push_str(&block([doc.as_str(), declaration.as_str(), ""]));
        }

        let file = format!("State_{s_name}.h");
        format!(
            "{}{}",
            banner(&file),
            include_guarded(
                &format!("LLFSM_{}_{}.h", m_name, s_name),
                body.trim_end_matches('\n')
            )
        )
    }

    fn state_implementation(
        &self,
        machine: &Machine,
        state_name: &str,
        options: &EmitOptions,
    ) -> String {
        let m_name = sanitize_identifier(&machine.name);
        let s_name = sanitize_identifier(state_name);
        let strukt = state_struct(&machine.name, state_name);
        let m_struct = machine_struct(&machine.name);
        let fsm = &machine.llfsm;

        let mut actions = vec![("on_entry", "OnEntry"), ("on_exit", "OnExit"), ("internal", "Internal")];
        if options.suspensible {
            actions.push(("on_suspend", "OnSuspend"));
            actions.push(("on_resume", "OnResume"));
        }

        let mut out = banner(&format!("State_{s_name}.c"));
        out.push_str(&block([
            &format!("#include \"Machine_{m_name}.h\""),
            &format!("#include \"State_{s_name}.h\""),
            "",
        ]));

        // Function-pointer wiring.
        out.push_str(&block([
            &format!("/// Initialise the given {state_name} state."),
            "///",
            "/// - Parameter state: The state to initialise.",
            &format!(
                "void {}(struct {strukt} * const state)",
                state_fn(&machine.name, state_name, "init")
            ),
        ]));
        let mut wiring = format!(
            "state->check_transitions = (struct LLFSMState *(*)(const struct LLFSMachine *, const struct LLFSMState *)){};\n",
            state_fn(&machine.name, state_name, "check_transitions")
        );
        for (field, _) in &actions {
            wiring.push_str(&format!(
                "state->{field} = (void (*)(struct LLFSMachine *, struct LLFSMState *)){};\n",
                state_fn(&machine.name, state_name, field)
            ));
        }
        out.push_str(&delimited("{", &indented(&wiring, "    "), "}"));
        out.push('\n');

        out.push_str(&block([
            &format!("/// Check the validity of the given {state_name} state."),
            "///",
            "/// - Parameter state: The state to validate.",
            &format!(
                "bool {}(const struct {m_struct} * const machine, const struct {strukt} * const state)",
                state_fn(&machine.name, state_name, "validate")
            ),
        ]));
        let mut checks = vec![format!(
            "state->check_transitions == (struct LLFSMState *(*)(const struct LLFSMachine *, const struct LLFSMState *)){}",
            state_fn(&machine.name, state_name, "check_transitions")
        )];
        for (field, _) in &actions {
            checks.push(format!(
                "state->{field} == (void (*)(struct LLFSMachine *, struct LLFSMState *)){}",
                state_fn(&machine.name, state_name, field)
            ));
        }
        let validate_body = format!(
            "    (void)machine;\n    return {};",
            checks.join(" &&\n           ")
        );
        out.push_str(&delimited("{", &validate_body, "}"));
        out.push('\n');

        for (field, section) in &actions {
            out.push_str(&block([
                &format!("/// The {section} function for {state_name}."),
                "///",
                "/// - Parameters:",
                "///   - machine: The machine this function belongs to.",
                "///   - state: The state this function belongs to.",
                &format!(
                    "void {}(struct {m_struct} * const machine, struct {strukt} * const state)",
                    state_fn(&machine.name, state_name, field)
                ),
                "{",
                &format!("#   include \"State_{s_name}_{section}.mm\""),
                "}",
                "",
            ]));
        }

        // First-match-wins dispatch, in attachment order.
        out.push_str(&block([
            &format!("/// Check the sequence of transitions for {state_name}."),
            "///",
            "/// - Returns: The state the machine transitions to (`NULL` if no transition fired).",
            &format!(
                "struct LLFSMState *{}(const struct {m_struct} * const machine, const struct {strukt} * const state)",
                state_fn(&machine.name, state_name, "check_transitions")
            ),
        ]));
        let mut dispatch_body = String::new();
        if let Some(state_id) = fsm.state_named(state_name) {
            let outgoing = fsm.transitions_from(state_id);
            let dispatch = for_each_indexed(&outgoing, |index, transition| {
                let target = fsm.state_index(transition.target).unwrap_or(0);
                block([
                    "if (".to_string(),
                    format!("    #include \"State_{s_name}_Transition_{index}.expr\""),
                    format!(") return machine->states[{target}];"),
                ])
                .trim_end()
                .to_string()
            });
            dispatch_body.push_str(&indented(&dispatch, "    "));
        }
        dispatch_body.push_str("    return NULL; // None of the transitions fired.");
        out.push_str(&delimited("{", &dispatch_body, "}"));
        out
    }

    fn build_fragment(&self, machine: &Machine) -> String {
        let name = sanitize_identifier(&machine.name);
        let fsm = &machine.llfsm;
        let sources = for_each(fsm.states(), |&id| {
            format!(
                "    State_{}.c",
                sanitize_identifier(fsm.state_name(id).unwrap_or_default())
            )
        });
        let mut out = format!("# Build fragment for the {} LLFSM.\n", machine.name);
        out.push_str(&block([
            &format!("add_library({name}_fsm STATIC"),
            &format!("    Machine_{name}.c"),
            sources.trim_end(),
            ")",
            &format!("target_include_directories({name}_fsm PRIVATE ${{CMAKE_CURRENT_SOURCE_DIR}})"),
        ]));
        out
    }

    fn arrangement_header(&self, arrangement: &Arrangement, _options: &EmitOptions) -> String {
        let includes = for_each(&arrangement.distinct_type_files(), |&type_file| {
            let type_name = arrangement
                .machine_for(type_file)
                .map(|m| sanitize_identifier(&m.name))
                .unwrap_or_default();
            format!("#include \"{type_file}/Machine_{type_name}.h\"")
        });
        let fields = for_each(&arrangement.instances, |instance| {
            format!(
                "    struct {} {};",
                machine_struct(&instance.machine.name),
                sanitize_identifier(&instance.name)
            )
        });

        let mut body = String::new();
        body.push_str(&includes);
        body.push_str(&block([
            "",
            &format!(
                "#define ARRANGEMENT_NUMBER_OF_INSTANCES {}",
                arrangement.instances.len()
            ),
            "",
            "/// The LLFSM instances of this arrangement.",
            "struct LLFSMArrangement",
            "{",
            fields.trim_end(),
            "};",
            "",
            "/// Initialise the arrangement and every machine instance in it.",
            "///",
            "/// - Parameter arrangement: The arrangement to initialise.",
            "void fsm_arrangement_init(struct LLFSMArrangement * const arrangement);",
            "",
            "/// Validate the arrangement and every machine instance in it.",
            "///",
            "/// - Parameter arrangement: The arrangement to validate.",
            "/// - Returns: `true` iff every machine instance appears valid.",
            "bool fsm_arrangement_validate(struct LLFSMArrangement * const arrangement);",
        ]));

        format!(
            "{}{}",
            banner("Arrangement.h"),
            include_guarded("LLFSM_Arrangement.h", &body)
        )
    }

    fn arrangement_implementation(&self, arrangement: &Arrangement) -> String {
        // One init/validate call per instance, each against its own
        // instance-named storage field.
        let inits = for_each(&arrangement.instances, |instance| {
            format!(
                "    {}(&arrangement->{});",
                machine_fn(&instance.machine.name, "init"),
                sanitize_identifier(&instance.name)
            )
        });
        let checks: Vec<String> = arrangement
            .instances
            .iter()
            .map(|instance| {
                format!(
                    "{}(&arrangement->{})",
                    machine_fn(&instance.machine.name, "validate"),
                    sanitize_identifier(&instance.name)
                )
            })
            .collect();
        let validate = if checks.is_empty() {
            "true".to_string()
        } else {
            checks.join(" &&\n           ")
        };

        let mut out = banner("Arrangement.c");
        out.push_str(&block([
            "#include \"Arrangement.h\"",
            "",
            "/// Initialise the arrangement and every machine instance in it.",
            "///",
            "/// - Parameter arrangement: The arrangement to initialise.",
            "void fsm_arrangement_init(struct LLFSMArrangement * const arrangement)",
            "{",
            inits.trim_end(),
            "}",
            "",
            "/// Validate the arrangement and every machine instance in it.",
            "///",
            "/// - Parameter arrangement: The arrangement to validate.",
            "/// - Returns: `true` iff every machine instance appears valid.",
            "bool fsm_arrangement_validate(struct LLFSMArrangement * const arrangement)",
            "{",
            &format!("    return {validate};"),
            "}",
        ]));
        out
    }

    fn arrangement_build_fragment(&self, arrangement: &Arrangement) -> String {
        let subdirs = for_each(&arrangement.distinct_type_files(), |&type_file| {
            format!("add_subdirectory({type_file})")
        });
        let mut out = String::from("# Build fragment for this LLFSM arrangement.\n");
        out.push_str(&subdirs);
        out.push_str(&block([
            "add_library(arrangement_fsm STATIC",
            "    Arrangement.c",
            ")",
            "target_include_directories(arrangement_fsm PRIVATE ${CMAKE_CURRENT_SOURCE_DIR})",
        ]));
        out
    }
}

impl OutputLanguage for CBinding {
    fn format(&self) -> Format {
        Format::C
    }

    fn machine_sections(&self) -> &'static [&'static str] {
        &["Includes", "Variables"]
    }

    fn state_sections(&self) -> &'static [&'static str] {
        &[
            "Includes",
            "Variables",
            "OnEntry",
            "OnExit",
            "Internal",
            "OnSuspend",
            "OnResume",
        ]
    }

    fn machine_section_file(&self, machine: &str, section: &str) -> String {
        format!("Machine_{}_{section}.h", sanitize_identifier(machine))
    }

    fn state_section_file(&self, state: &str, section: &str) -> String {
        let extension = match section {
            "Includes" | "Variables" => "h",
            _ => "mm",
        };
        format!("State_{}_{section}.{extension}", sanitize_identifier(state))
    }

    fn add_machine_code(
        &self,
        tree: &mut FileTree,
        machine: &Machine,
        options: &EmitOptions,
    ) -> Result<()> {
        let name = sanitize_identifier(&machine.name);
        tree.insert_text(
            format!("Machine_{name}.h"),
            self.machine_header(machine, options),
        );
        tree.insert_text(
            format!("Machine_{name}.c"),
            self.machine_implementation(machine, options),
        );
        tree.insert_text("CMakeLists.txt", self.build_fragment(machine));

        let fsm: &Llfsm = &machine.llfsm;
        for &state_id in fsm.states() {
            let Some(state_name) = fsm.state_name(state_id).map(str::to_string) else {
                continue;
            };
            let s_name = sanitize_identifier(&state_name);
            tree.insert_text(
                format!("State_{s_name}.h"),
                self.state_header(machine, &state_name, options),
            );
            tree.insert_text(
                format!("State_{s_name}.c"),
                self.state_implementation(machine, &state_name, options),
            );
            for (index, transition) in fsm.transitions_from(state_id).iter().enumerate() {
                tree.insert_text(
                    format!("State_{s_name}_Transition_{index}.expr"),
                    transition.label.clone(),
                );
            }
        }
        Ok(())
    }

    fn add_arrangement_code(
        &self,
        tree: &mut FileTree,
        arrangement: &Arrangement,
        options: &EmitOptions,
    ) -> Result<()> {
        tree.insert_text(
            "Arrangement.h",
            self.arrangement_header(arrangement, options),
        );
        tree.insert_text(
            "Arrangement.c",
            self.arrangement_implementation(arrangement),
        );
        tree.insert_text(
            "CMakeLists.txt",
            self.arrangement_build_fragment(arrangement),
        );
        Ok(())
    }
}
