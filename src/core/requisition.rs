// src/core/requisition.rs

//! The live state of one command line being typed.
//!
//! A requisition tokenizes the input, matches the longest command it can,
//! distributes the remaining arguments over the command's parameters and
//! converts each of them. Every edit (typing, completion, stepping a value)
//! goes back through the same text-driven update, so the input string is
//! always the single source of truth.

use crate::{
    constants::COMMAND_PARAM_NAME,
    core::{
        argument::{ArgId, Argument, ArgumentKind, BegetOptions, Slot},
        assignment::Assignment,
        canon::Command,
        conversion::{Conversion, Status},
        parameters::Parameter,
        tokenizer::tokenize,
        types::{DeferredLookup, ParseContext, TypeKind},
    },
    state::System,
    system::{
        context::ExecutionContext,
        executor::{self, ExecError, Report},
    },
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    iter::repeat_n,
    sync::Arc,
};

lazy_static! {
    // A number parameter still accepts "-5", so only "-x"/"--" look like names there.
    static ref INCOMPLETE_NAME_RE: Regex =
        Regex::new(r"^-[-a-zA-Z_]").expect("Failed to compile incomplete name regex");
}

// --- UPDATE RESULTS ---

/// One assignment whose value or text changed during an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentChange {
    pub param: String,
    pub old_value: Value,
    pub new_value: Value,
    pub old_text: String,
    pub new_text: String,
}

/// What an update did. Replaces change notifications: callers inspect the
/// report instead of subscribing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub update_id: u64,
    pub command_changed: bool,
    pub assignment_changes: Vec<AssignmentChange>,
    /// The input after the update.
    pub text: String,
}

/// A started update that may need asynchronous lookups before it can be
/// applied. Only the most recently started ticket is ever applied.
#[derive(Debug, Clone)]
pub struct UpdateTicket {
    id: u64,
    typed: String,
    lookups: Vec<DeferredLookup>,
}

impl UpdateTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// True when no lookup is left to load.
    pub fn is_ready(&self) -> bool {
        self.lookups.iter().all(DeferredLookup::is_loaded)
    }

    pub async fn load(&self) {
        for lookup in &self.lookups {
            lookup.load().await;
        }
    }
}

/// A run of input characters sharing one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSpan {
    pub status: Status,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// Keep the execution out of the report log.
    pub hidden: bool,
}

type Snapshot = Vec<(String, Value, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Prefix,
    Text,
    Suffix,
}

/// One input character and the argument it came from.
struct Trace<'a> {
    arg: &'a Argument,
    character: char,
    part: Part,
}

// --- REQUISITION ---

#[derive(Debug)]
pub struct Requisition {
    system: Arc<System>,
    context: ExecutionContext,
    typed: String,
    args: Vec<Argument>,
    command_assignment: Assignment,
    command: Option<Arc<Command>>,
    assignments: Vec<Assignment>,
    unassigned: Vec<Assignment>,
    update_id: u64,
    structural_change_in_progress: bool,
}

impl Requisition {
    pub fn new(system: Arc<System>) -> Self {
        Self::with_context(system, ExecutionContext::from_process(""))
    }

    pub fn with_context(system: Arc<System>, context: ExecutionContext) -> Self {
        let command_type = system.command_type();
        let blank = command_type.get_blank(&ParseContext::with_values(
            Map::new(),
            system.max_predictions(),
        ));
        let command_param = Arc::new(Parameter::new(COMMAND_PARAM_NAME, command_type));
        let mut requisition = Self {
            system,
            context,
            typed: String::new(),
            args: Vec::new(),
            command_assignment: Assignment::new(command_param, Slot::Command, blank),
            command: None,
            assignments: Vec::new(),
            unassigned: Vec::new(),
            update_id: 0,
            structural_change_in_progress: false,
        };
        requisition.update("");
        requisition
    }

    // --- ACCESSORS ---

    pub fn system(&self) -> &Arc<System> {
        &self.system
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// The matched command. May be a group while the user is still typing.
    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    pub fn command_assignment(&self) -> &Assignment {
        &self.command_assignment
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn unassigned(&self) -> &[Assignment] {
        &self.unassigned
    }

    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn get_assignment(&self, name: &str) -> Option<&Assignment> {
        if name == COMMAND_PARAM_NAME {
            return Some(&self.command_assignment);
        }
        self.assignments.iter().find(|a| a.param().name() == name)
    }

    fn assignment(&self, slot: Slot) -> Option<&Assignment> {
        match slot {
            Slot::Command => Some(&self.command_assignment),
            Slot::Param(index) => self.assignments.get(index),
            Slot::Unassigned(index) => self.unassigned.get(index),
        }
    }

    fn all_assignments(&self) -> impl Iterator<Item = &Assignment> {
        std::iter::once(&self.command_assignment)
            .chain(self.assignments.iter())
            .chain(self.unassigned.iter())
    }

    /// The first parameter that could still take a positional value.
    pub fn get_first_blank_positional(&self) -> Option<&Assignment> {
        self.assignments.iter().find(|a| {
            a.param().is_positional_allowed() && a.arg().is_blank_kind()
        })
    }

    /// `param name -> value`, with defaults filled in.
    pub fn get_args_object(&self) -> Map<String, Value> {
        self.assignments
            .iter()
            .map(|a| (a.param().name().to_string(), a.effective_value()))
            .collect()
    }

    fn context_with(&self, values: Map<String, Value>) -> ParseContext {
        ParseContext::with_values(values, self.system.max_predictions())
    }

    fn value_context(&self) -> ParseContext {
        self.context_with(self.get_args_object())
    }

    // --- UPDATES ---

    /// Re-parses the whole input.
    pub fn update(&mut self, typed: &str) -> UpdateReport {
        self.update_id += 1;
        self.apply(typed)
    }

    /// Starts an update whose lookups may need loading. Any ticket started
    /// before this one becomes stale.
    pub fn begin_update(&mut self, typed: &str) -> UpdateTicket {
        let lookups = self.pending_lookups_for(typed);
        self.update_id += 1;
        log::trace!(
            "Update {} started with {} pending lookup(s)",
            self.update_id,
            lookups.len()
        );
        UpdateTicket {
            id: self.update_id,
            typed: typed.to_string(),
            lookups,
        }
    }

    /// Applies a ticket, unless a newer update started in the meantime.
    pub fn finish_update(&mut self, ticket: UpdateTicket) -> Option<UpdateReport> {
        if ticket.id != self.update_id {
            log::debug!(
                "Discarding stale update {} (latest is {})",
                ticket.id,
                self.update_id
            );
            return None;
        }
        Some(self.apply(&ticket.typed))
    }

    /// Loads whatever the input needs, then applies it. A loaded value can
    /// make a delegated type need lookups of its own, so this repeats until
    /// nothing is pending.
    pub async fn update_async(&mut self, typed: &str) -> Option<UpdateReport> {
        let mut ticket = self.begin_update(typed);
        while !ticket.is_ready() {
            ticket.load().await;
            ticket = self.begin_update(typed);
        }
        self.finish_update(ticket)
    }

    /// The unloaded lookups `typed` reaches. Parses it on a scratch
    /// requisition so delegated types can resolve from their siblings.
    fn pending_lookups_for(&self, typed: &str) -> Vec<DeferredLookup> {
        let mut scratch = Self::with_context(self.system.clone(), self.context.clone());
        scratch.apply(typed);
        let ctx = scratch.value_context();

        let mut lookups = self.system.command_type().pending_lookups(&ctx);
        for assignment in &scratch.assignments {
            lookups.extend(assignment.type_().pending_lookups(&ctx));
        }
        lookups.retain(|lookup| !lookup.is_loaded());
        lookups
    }

    /// Empties the input.
    pub fn clear(&mut self) -> UpdateReport {
        self.update("")
    }

    fn apply(&mut self, typed: &str) -> UpdateReport {
        let before = self.snapshot();
        self.typed = typed.to_string();
        self.args = tokenize(typed);
        log::trace!("Tokenized '{}' into {} argument(s)", typed, self.args.len());

        let (conversion, used) = self.match_command(&self.args);
        let remaining = self.args.get(used..).unwrap_or_default().to_vec();
        let command = conversion
            .value
            .as_str()
            .and_then(|name| self.system.canon().get_command(name));

        let command_changed = command_differs(self.command.as_ref(), command.as_ref());
        if command_changed {
            log::debug!(
                "Command changed to {:?}",
                command.as_ref().map(|c| c.name.as_str())
            );
            self.command = command;
            self.assignments.clear();
        }
        self.command_assignment.set_conversion(conversion);
        self.assign(remaining);
        self.stamp_owners();
        self.diff(&before, command_changed)
    }

    /// Finds the command at the start of the input.
    ///
    /// # Logic:
    /// - Start with the first argument.
    /// - While the match is a group and more arguments follow, merge in the
    ///   next one and try again ("pref" -> "pref set").
    /// - Returns the conversion and how many arguments it consumed.
    fn match_command(&self, args: &[Argument]) -> (Conversion, usize) {
        let ctx = self.context_with(Map::new());
        let command_type = self.system.command_type();
        let canon = self.system.canon();
        let mut used = 1;
        loop {
            let arg = match args.get(..used.min(args.len())) {
                Some([single]) => single.clone(),
                Some(run) if !run.is_empty() => Argument::merged(run.to_vec()),
                _ => Argument::new("", "", ""),
            };
            let conversion = command_type.parse(&arg, &ctx);
            let is_group = conversion
                .value
                .as_str()
                .and_then(|name| canon.get_command(name))
                .is_some_and(|c| !c.is_executable());
            if !is_group || used >= args.len() {
                return (conversion, used.min(args.len()));
            }
            used += 1;
        }
    }

    /// Distributes the arguments after the command over its parameters and
    /// converts them.
    ///
    /// # Logic:
    /// - No command, or a command without parameters: everything is unassigned.
    /// - A lone string parameter takes all arguments as one merged value.
    /// - Otherwise named arguments are claimed first, then the rest fill the
    ///   remaining positional parameters in declaration order.
    /// - Parameters convert in declaration order, each seeing the values of
    ///   the ones before it.
    fn assign(&mut self, args: Vec<Argument>) {
        let params: Vec<Arc<Parameter>> = self
            .command
            .as_ref()
            .map(|c| c.params.clone())
            .unwrap_or_default();
        let mut planned: Vec<Option<Argument>> = vec![None; params.len()];
        let mut leftovers: Vec<Argument> = Vec::new();

        let meaningful = args.len() > 1 || args.first().is_some_and(|a| !a.is_blank());
        match params.as_slice() {
            _ if self.command.is_none() => {
                leftovers.extend(args.into_iter().filter(|a| !a.is_blank()));
            }
            [] => leftovers.extend(args.into_iter().filter(|a| !a.is_blank())),
            _ if !meaningful => {}
            [only] if only.kind() == TypeKind::String && only.is_positional_allowed() => {
                let arg = if args.len() == 1 {
                    args.into_iter().next()
                } else {
                    Some(Argument::merged(args))
                };
                if let Some(first) = planned.first_mut() {
                    *first = arg;
                }
            }
            _ => distribute(&params, args, &mut planned, &mut leftovers),
        }

        self.convert(&params, planned);

        let ctx = self.context_with(Map::new());
        self.unassigned = leftovers
            .into_iter()
            .enumerate()
            .map(|(index, arg)| Assignment::unassigned(arg, &self.assignments, index, &ctx))
            .collect();
        if !self.unassigned.is_empty() {
            log::debug!("{} unassigned argument(s)", self.unassigned.len());
        }
    }

    fn convert(&mut self, params: &[Arc<Parameter>], planned: Vec<Option<Argument>>) {
        if self.assignments.len() != params.len() {
            let ctx = self.context_with(Map::new());
            self.assignments = params
                .iter()
                .enumerate()
                .map(|(index, param)| {
                    Assignment::new(param.clone(), Slot::Param(index), param.type_().get_blank(&ctx))
                })
                .collect();
        }

        let mut values = Map::new();
        for (index, (param, arg)) in params.iter().zip(planned).enumerate() {
            let ctx = self.context_with(values.clone());
            let conversion = match arg {
                Some(arg) => param.type_().parse(&arg, &ctx),
                None => param.type_().get_blank(&ctx),
            };
            if let Some(assignment) = self.assignments.get_mut(index) {
                assignment.set_conversion(conversion);
                values.insert(param.name().to_string(), assignment.effective_value());
            }
        }
    }

    /// Marks every token with the assignment it ended up in.
    fn stamp_owners(&mut self) {
        let owners: HashMap<ArgId, Slot> = self
            .all_assignments()
            .flat_map(|assignment| {
                assignment
                    .arg()
                    .get_args()
                    .into_iter()
                    .map(|leaf| (leaf.id(), assignment.slot()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for arg in &mut self.args {
            arg.assign(owners.get(&arg.id()).copied().unwrap_or(Slot::Command));
        }
    }

    fn snapshot(&self) -> Snapshot {
        std::iter::once(&self.command_assignment)
            .chain(self.assignments.iter())
            .map(|a| (a.param().name().to_string(), a.value().clone(), a.arg().to_string()))
            .collect()
    }

    fn diff(&self, before: &Snapshot, command_changed: bool) -> UpdateReport {
        let assignment_changes = self
            .snapshot()
            .into_iter()
            .filter_map(|(param, new_value, new_text)| {
                let (old_value, old_text) = before
                    .iter()
                    .find(|(name, _, _)| *name == param)
                    .map(|(_, value, text)| (value.clone(), text.clone()))
                    .unwrap_or((Value::Null, String::new()));
                (old_value != new_value || old_text != new_text).then_some(AssignmentChange {
                    param,
                    old_value,
                    new_value,
                    old_text,
                    new_text,
                })
            })
            .collect();
        UpdateReport {
            update_id: self.update_id,
            command_changed,
            assignment_changes,
            text: self.to_string(),
        }
    }

    // --- QUERIES ---

    /// The worst status over the command, the parameters and any unassigned
    /// arguments.
    pub fn get_status(&self) -> Status {
        self.all_assignments()
            .map(Assignment::status)
            .fold(Status::Valid, Status::combine)
    }

    /// The first thing worth telling the user about, or an empty string.
    pub fn get_status_message(&self) -> String {
        let ordered = self
            .unassigned
            .iter()
            .chain(std::iter::once(&self.command_assignment))
            .chain(self.assignments.iter());
        for assignment in ordered {
            if assignment.status() == Status::Valid {
                continue;
            }
            if !assignment.message().is_empty() {
                return assignment.message().to_string();
            }
            if assignment.slot() != Slot::Command && assignment.arg().is_blank_kind() {
                return format!("Value required for '{}'.", assignment.param().name());
            }
        }
        String::new()
    }

    /// The assignment the cursor is in.
    ///
    /// # Logic:
    /// - Position 0 is always the command.
    /// - Prefix and text characters belong to their argument's assignment.
    /// - Trailing whitespace belongs to whatever the user would type next:
    ///   still the same assignment inside `--name value`, otherwise the next
    ///   argument's, or the first blank positional parameter at the end.
    pub fn get_assignment_at(&self, cursor: usize) -> &Assignment {
        if cursor == 0 {
            return &self.command_assignment;
        }
        let mut positions: Vec<Slot> = Vec::new();
        for (index, arg) in self.args.iter().enumerate() {
            let slot = arg.owner().unwrap_or(Slot::Command);
            let span = arg.prefix().chars().count() + arg.source().chars().count();
            positions.extend(repeat_n(slot, span));

            let owner_is_named = self.assignment(slot).is_some_and(|a| a.arg().is_named());
            let suffix_slot = if owner_is_named {
                slot
            } else if let Some(next) = self.args.get(index + 1) {
                next.owner().unwrap_or(Slot::Command)
            } else {
                self.get_first_blank_positional().map_or(slot, Assignment::slot)
            };
            positions.extend(repeat_n(suffix_slot, arg.suffix().chars().count()));
        }
        let slot = positions
            .get(cursor - 1)
            .or(positions.last())
            .copied()
            .unwrap_or(Slot::Command);
        self.assignment(slot).unwrap_or(&self.command_assignment)
    }

    /// Per-character status of the input, as runs.
    ///
    /// # Logic:
    /// - Whitespace and quotes are always VALID.
    /// - An INCOMPLETE parameter only stays INCOMPLETE where the cursor is:
    ///   anywhere else the user has moved on, so it is shown as an ERROR.
    /// - The command is never escalated.
    pub fn get_input_status_markup(&self, cursor: usize) -> Vec<StatusSpan> {
        let traces = self.traces();
        let current = traces.get(cursor.saturating_sub(1)).or(traces.last());
        let current_slot = current.map(|t| t.arg.owner().unwrap_or(Slot::Command));
        let current_inside = current.is_some_and(|t| {
            let named = current_slot
                .and_then(|slot| self.assignment(slot))
                .is_some_and(|a| a.arg().is_named());
            t.part == Part::Text || (named && t.part == Part::Suffix)
        });

        let mut spans: Vec<StatusSpan> = Vec::new();
        for trace in &traces {
            let status = if trace.part == Part::Text {
                let slot = trace.arg.owner().unwrap_or(Slot::Command);
                let status = self
                    .assignment(slot)
                    .map_or(Status::Valid, |a| a.status_for(Some(trace.arg.id())));
                let at_cursor = current_inside && current_slot == Some(slot);
                if status == Status::Incomplete && !at_cursor && slot != Slot::Command {
                    Status::Error
                } else {
                    status
                }
            } else {
                Status::Valid
            };
            match spans.last_mut() {
                Some(span) if span.status == status => span.text.push(trace.character),
                _ => spans.push(StatusSpan {
                    status,
                    text: trace.character.to_string(),
                }),
            }
        }
        spans
    }

    /// The markup as one symbol per character, e.g. `"VVVVVEEE"`.
    pub fn get_input_status_string(&self, cursor: usize) -> String {
        self.get_input_status_markup(cursor)
            .iter()
            .flat_map(|span| repeat_n(span.status.symbol(), span.text.chars().count()))
            .collect()
    }

    fn traces(&self) -> Vec<Trace<'_>> {
        let mut traces = Vec::new();
        for arg in &self.args {
            for (part, text) in [
                (Part::Prefix, arg.prefix()),
                (Part::Text, arg.source()),
                (Part::Suffix, arg.suffix()),
            ] {
                traces.extend(text.chars().map(|character| Trace {
                    arg,
                    character,
                    part,
                }));
            }
        }
        traces
    }

    /// The input normalized: full command name, positional values in order up
    /// to the last one that differs from its default, then named values.
    pub fn to_canonical_string(&self) -> String {
        let ctx = self.value_context();
        let mut parts: Vec<String> = vec![match &self.command {
            Some(command) => command.name.clone(),
            None => self.command_assignment.arg().text().to_string(),
        }];

        let is_set = |a: &Assignment| {
            let value = a.effective_value();
            !value.is_null() && Some(&value) != a.param().default_value().as_ref()
        };

        let positional: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.param().is_positional_allowed())
            .collect();
        let last = positional.iter().rposition(|a| is_set(*a));
        for assignment in positional.iter().take(last.map_or(0, |l| l + 1)) {
            let value = assignment.effective_value();
            let text = if value.is_null() {
                String::new()
            } else {
                assignment.type_().stringify(&value, &ctx)
            };
            parts.push(if assignment.param().kind() == TypeKind::Array {
                text
            } else {
                quote(text)
            });
        }

        for assignment in self.assignments.iter().filter(|a| !a.param().is_positional_allowed()) {
            if !is_set(assignment) {
                continue;
            }
            let name = assignment.param().name();
            let value = assignment.effective_value();
            match (assignment.param().kind(), &value) {
                (TypeKind::Boolean, Value::Bool(true)) => parts.push(format!("--{}", name)),
                (TypeKind::Boolean, _) => {}
                (TypeKind::Array, Value::Array(elements)) => {
                    for element in elements {
                        let text = assignment
                            .type_()
                            .stringify(&Value::Array(vec![element.clone()]), &ctx);
                        parts.push(format!("--{} {}", name, quote(text)));
                    }
                }
                _ => {
                    let text = assignment.type_().stringify(&value, &ctx);
                    parts.push(format!("--{} {}", name, quote(text)));
                }
            }
        }

        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    // --- EDITS ---

    /// Replaces the argument of one assignment and re-parses the result.
    ///
    /// # Logic:
    /// - Setting a positional parameter first fills the blank positional
    ///   parameters before it (with their defaults) so the value lands in the
    ///   right place.
    /// - The new argument's leaves replace the old ones in the token list; a
    ///   blank assignment appends them at the end.
    /// - The whole input is then re-parsed from text, once. Assignments made
    ///   while filling holes only rewrite the token list; the outer call
    ///   re-parses and reports every change together.
    pub fn set_assignment(&mut self, slot: Slot, arg: Option<Argument>) -> UpdateReport {
        if self.structural_change_in_progress {
            self.splice(slot, arg.as_ref());
            return UpdateReport {
                update_id: self.update_id,
                command_changed: false,
                assignment_changes: Vec::new(),
                text: self.to_string(),
            };
        }

        let before = self.snapshot();
        let command_before = self.command.clone();
        self.structural_change_in_progress = true;
        for (hole, filler) in self.positional_holes(slot, arg.as_ref()) {
            self.set_assignment(hole, Some(filler));
        }
        self.splice(slot, arg.as_ref());
        self.structural_change_in_progress = false;

        let text = self.to_string();
        self.update(&text);
        let command_changed = command_differs(command_before.as_ref(), self.command.as_ref());
        self.diff(&before, command_changed)
    }

    /// Blank positional parameters before `slot`, each with the argument that
    /// fills it with its default.
    fn positional_holes(&self, slot: Slot, arg: Option<&Argument>) -> Vec<(Slot, Argument)> {
        let Slot::Param(index) = slot else {
            return Vec::new();
        };
        let Some(target) = self.assignments.get(index) else {
            return Vec::new();
        };
        if !target.param().is_positional_allowed()
            || !target.arg().is_blank_kind()
            || arg.is_none_or(Argument::is_named)
        {
            return Vec::new();
        }

        let ctx = self.value_context();
        self.assignments
            .iter()
            .take(index)
            .filter(|a| {
                a.param().is_positional_allowed()
                    && a.arg().is_blank_kind()
                    && a.param().kind() != TypeKind::Array
            })
            .map(|a| {
                let text = a
                    .param()
                    .default_value()
                    .filter(|v| !v.is_null())
                    .map(|v| a.type_().stringify(&v, &ctx))
                    .unwrap_or_default();
                let filler = Argument::blank().beget(BegetOptions {
                    text: Some(text),
                    prefix_space: true,
                    ..Default::default()
                });
                (a.slot(), filler)
            })
            .collect()
    }

    fn splice(&mut self, slot: Slot, replacement: Option<&Argument>) {
        let originals: Vec<ArgId> = self
            .assignment(slot)
            .map(|a| {
                a.arg()
                    .get_args()
                    .iter()
                    .filter(|leaf| !leaf.is_blank_kind())
                    .map(|leaf| leaf.id())
                    .collect()
            })
            .unwrap_or_default();
        let replacements: Vec<Argument> = replacement
            .map(|r| {
                r.get_args()
                    .into_iter()
                    .filter(|leaf| !leaf.is_blank_kind())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut last_index: Option<usize> = None;
        for i in 0..originals.len().max(replacements.len()) {
            let original = originals
                .get(i)
                .and_then(|id| self.args.iter().position(|a| a.id() == *id));
            match (original, replacements.get(i)) {
                (Some(position), Some(new)) => {
                    if let Some(existing) = self.args.get_mut(position) {
                        *existing = new.clone();
                    }
                    last_index = Some(position);
                }
                (Some(position), None) => {
                    self.args.remove(position);
                }
                (None, Some(new)) => {
                    let position = last_index.map_or(self.args.len(), |p| p + 1);
                    let spaced = self.spaced(position, new);
                    self.args.insert(position, spaced);
                    last_index = Some(position);
                }
                (None, None) => {}
            }
        }
    }

    /// Makes sure an inserted token is separated from the one before it.
    fn spaced(&self, position: usize, arg: &Argument) -> Argument {
        let previous = position.checked_sub(1).and_then(|p| self.args.get(p));
        let needs_space = previous.is_some_and(|prev| {
            let text = prev.to_string();
            !text.is_empty() && !text.ends_with(char::is_whitespace)
        }) && !arg.prefix().starts_with(char::is_whitespace);
        let mut spaced = arg.clone();
        if needs_space {
            spaced.prepend_prefix(" ");
        }
        spaced
    }

    /// Sets a parameter by value, writing the matching text into the input.
    /// `Value::Null` removes whatever was typed for it.
    pub fn set_value(&mut self, name: &str, value: Value) -> Option<UpdateReport> {
        let index = self.assignments.iter().position(|a| a.param().name() == name)?;
        let assignment = self.assignments.get(index)?;
        let param = assignment.param().clone();
        let current = assignment.arg().clone();
        let ctx = self.value_context();
        let flag = || Argument::new(format!("--{}", name), " ", "");

        let replacement = match param.kind() {
            _ if value.is_null() => None,
            TypeKind::Boolean => match (value.as_bool(), current.kind()) {
                (Some(true), ArgumentKind::TrueNamed(_)) => Some(current),
                (Some(true), _) => Some(Argument::true_named(flag())),
                _ => None,
            },
            TypeKind::Array => {
                let named = !param.is_positional_allowed()
                    || current.elements().iter().any(Argument::is_named);
                let values = value.as_array().cloned().unwrap_or_else(|| vec![value.clone()]);
                let elements = values
                    .into_iter()
                    .map(|element| {
                        let text = param.type_().stringify(&Value::Array(vec![element]), &ctx);
                        let element = Argument::blank().beget(BegetOptions {
                            text: Some(text),
                            prefix_space: true,
                            ..Default::default()
                        });
                        if named {
                            Argument::named(flag(), Some(element))
                        } else {
                            element
                        }
                    })
                    .collect();
                Some(Argument::array(elements))
            }
            _ => {
                let text = param.type_().stringify(&value, &ctx);
                if current.is_named() {
                    Some(current.beget(BegetOptions {
                        text: Some(text),
                        ..Default::default()
                    }))
                } else if !param.is_positional_allowed() {
                    let value = Argument::blank().beget(BegetOptions {
                        text: Some(text),
                        prefix_space: true,
                        ..Default::default()
                    });
                    Some(Argument::named(flag(), Some(value)))
                } else {
                    Some(beget_in_place(
                        &current,
                        BegetOptions {
                            text: Some(text),
                            ..Default::default()
                        },
                    ))
                }
            }
        };
        Some(self.set_assignment(Slot::Param(index), replacement))
    }

    /// Completes the assignment under the cursor with its `index`-th
    /// prediction (wrapping). Without predictions, a valid value just gets a
    /// trailing space so the user can move on.
    pub fn complete(&mut self, cursor: usize, index: isize) -> Option<UpdateReport> {
        let assignment = self.get_assignment_at(cursor);
        let slot = assignment.slot();
        let replacement = match assignment.prediction_at(index) {
            Some(prediction) => beget_in_place(
                assignment.arg(),
                BegetOptions {
                    text: Some(prediction.name.clone()),
                    dont_quote: slot == Slot::Command,
                    suffix_space: !prediction.incomplete,
                    ..Default::default()
                },
            ),
            None => {
                let arg = assignment.arg();
                if assignment.status() != Status::Valid
                    || arg.is_blank_kind()
                    || arg.suffix().ends_with(' ')
                {
                    return None;
                }
                beget_in_place(
                    arg,
                    BegetOptions {
                        dont_quote: slot == Slot::Command,
                        suffix_space: true,
                        ..Default::default()
                    },
                )
            }
        };
        log::debug!("Completing {:?} with '{}'", slot, replacement.text());
        Some(self.set_assignment(slot, Some(replacement)))
    }

    /// Steps the value under the cursor up.
    pub fn increment(&mut self, cursor: usize) -> Option<UpdateReport> {
        self.step(cursor, true)
    }

    /// Steps the value under the cursor down.
    pub fn decrement(&mut self, cursor: usize) -> Option<UpdateReport> {
        self.step(cursor, false)
    }

    fn step(&mut self, cursor: usize, up: bool) -> Option<UpdateReport> {
        let ctx = self.value_context();
        let assignment = self.get_assignment_at(cursor);
        let Slot::Param(_) = assignment.slot() else {
            return None;
        };
        let type_ = assignment.type_();
        let next = if up {
            type_.increment(assignment.value(), &ctx)
        } else {
            type_.decrement(assignment.value(), &ctx)
        }?;

        let param = assignment.param().clone();
        if param.kind() == TypeKind::Boolean || !param.is_positional_allowed() {
            return self.set_value(param.name(), next);
        }
        let replacement = beget_in_place(
            assignment.arg(),
            BegetOptions {
                text: Some(type_.stringify(&next, &ctx)),
                ..Default::default()
            },
        );
        let slot = assignment.slot();
        Some(self.set_assignment(slot, Some(replacement)))
    }

    /// Runs the current command and resets the input.
    ///
    /// # Errors
    /// Fails without running anything when no command matched, when the
    /// command is a group, or when the input is not valid. Failures of the
    /// command itself are reported inside the returned `Report`.
    pub async fn exec(&mut self, options: ExecOptions) -> Result<Report, ExecError> {
        let Some(command) = self.command.clone() else {
            let typed = self.command_assignment.arg().text().to_string();
            return Err(ExecError::UnknownCommand(typed));
        };
        if !command.is_executable() {
            return Err(ExecError::NotExecutable(command.name.clone()));
        }
        if self.get_status() != Status::Valid {
            return Err(ExecError::InvalidInput(self.get_status_message()));
        }

        let ctx = ExecutionContext {
            typed: self.typed.clone(),
            ..self.context.clone()
        };
        let report =
            executor::execute(&command, self.get_args_object(), &ctx, self.to_canonical_string())
                .await?;
        if !options.hidden && !command.hidden {
            self.system.reports().push(report.clone());
        }
        self.update("");
        Ok(report)
    }
}

impl fmt::Display for Requisition {
    /// The input exactly as typed (or as rebuilt after edits).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arg in &self.args {
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

/// Claims named arguments first, then hands out positional ones.
fn distribute(
    params: &[Arc<Parameter>],
    mut args: Vec<Argument>,
    planned: &mut [Option<Argument>],
    leftovers: &mut Vec<Argument>,
) {
    let mut unnamed: Vec<usize> = (0..params.len()).collect();
    let mut arrays: BTreeMap<usize, Argument> = BTreeMap::new();

    for (index, param) in params.iter().enumerate() {
        let mut i = 0;
        while i < args.len() {
            if !args.get(i).is_some_and(|a| param.is_known_as(a.text())) {
                i += 1;
                continue;
            }
            let name = args.remove(i);
            unnamed.retain(|&p| p != index);
            let arg = if param.kind() == TypeKind::Boolean {
                Argument::true_named(name)
            } else {
                let value = (i < args.len()).then(|| args.remove(i));
                Argument::named(name, value)
            };

            if param.kind() == TypeKind::Array {
                arrays
                    .entry(index)
                    .or_insert_with(|| Argument::array(Vec::new()))
                    .push(arg);
            } else {
                match planned.get_mut(index) {
                    Some(slot) if slot.is_none() => *slot = Some(arg),
                    _ => {
                        log::debug!("Parameter '{}' was given more than once", param.name());
                        leftovers.extend(arg.get_args().into_iter().cloned());
                    }
                }
            }
        }
    }

    for index in unnamed {
        let Some(param) = params.get(index) else {
            continue;
        };
        if !param.is_positional_allowed() {
            continue;
        }
        if param.kind() == TypeKind::Array {
            arrays
                .entry(index)
                .or_insert_with(|| Argument::array(Vec::new()))
                .extend(args.drain(..));
            continue;
        }
        if args.is_empty() {
            continue;
        }
        let arg = args.remove(0);
        let looks_named = if param.kind() == TypeKind::Number {
            INCOMPLETE_NAME_RE.is_match(arg.text())
        } else {
            arg.text().starts_with('-')
        };
        if looks_named {
            leftovers.push(arg);
        } else if let Some(slot) = planned.get_mut(index) {
            *slot = Some(arg);
        }
    }

    for (index, arg) in arrays {
        if let Some(slot) = planned.get_mut(index) {
            *slot = Some(arg);
        }
    }
    leftovers.extend(args.into_iter().filter(|a| !a.is_blank()));
}

/// `beget` that targets the last element of an array argument.
fn beget_in_place(arg: &Argument, options: BegetOptions) -> Argument {
    match arg.kind() {
        ArgumentKind::Array(elements) => {
            let mut elements = elements.clone();
            let last = elements.pop().unwrap_or_else(Argument::blank);
            elements.push(last.beget(BegetOptions {
                prefix_space: true,
                ..options
            }));
            Argument::array(elements)
        }
        _ => arg.beget(options),
    }
}

/// Quotes stringified text that would otherwise split into several tokens.
/// Quotes and backslashes inside it are already escaped by `stringify`.
fn quote(text: String) -> String {
    if text.is_empty() || text.contains(' ') {
        format!("'{}'", text)
    } else {
        text
    }
}

fn command_differs(old: Option<&Arc<Command>>, new: Option<&Arc<Command>>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
        (None, None) => false,
        _ => true,
    }
}

// MARK: --- UNIT TESTS ---
