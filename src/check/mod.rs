use std::ops::Range;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::ir::FunctionDef;

pub mod errors;
pub mod stack;

pub use errors::{CheckError, Imbalance, Location};
pub use stack::{AbstractStack, EffectError};

#[derive(Debug, Clone)]
pub struct FileSpan {
    pub span: Range<usize>,
    pub path: String,
}

impl FileSpan {
    pub fn new(path: String, span: Range<usize>) -> Self {
        Self { path, span }
    }
}

impl ariadne::Span for FileSpan {
    type SourceId = String;

    fn source(&self) -> &Self::SourceId {
        &self.path
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

/// A function rendered as text, `: name ( entry -- exit ) op op ;`, with the
/// byte ranges of its parts so diagnostics can point into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub text: String,
    pub name: Range<usize>,
    pub signature: Range<usize>,
    pub exit: Range<usize>,
    pub ops: Vec<Range<usize>>,
}

impl Listing {
    pub fn new(def: &FunctionDef) -> Self {
        let mut text = String::from(": ");
        let name = append(&mut text, &def.name);

        text.push(' ');
        let signature_start = text.len();
        text.push('(');
        for ty in &def.entry {
            text.push(' ');
            text.push_str(&ty.to_string());
        }
        text.push(' ');
        let exit_start = text.len();
        text.push_str("--");
        for ty in &def.exit {
            text.push(' ');
            text.push_str(&ty.to_string());
        }
        text.push_str(" )");
        let signature = signature_start..text.len();
        let exit = exit_start..text.len();

        let ops = def
            .body
            .iter()
            .map(|op| {
                text.push(' ');
                append(&mut text, &op.to_string())
            })
            .collect();
        text.push_str(" ;");

        Self {
            text,
            name,
            signature,
            exit,
            ops,
        }
    }

    pub fn source(&self) -> Source<String> {
        Source::from(self.text.clone())
    }

    fn span_of(&self, location: Option<Location>) -> Range<usize> {
        match location {
            Some(Location::Signature) => self.signature.clone(),
            Some(Location::Exit) => self.exit.clone(),
            Some(Location::Op(index)) => self
                .ops
                .get(index)
                .cloned()
                .unwrap_or_else(|| self.name.clone()),
            None => self.name.clone(),
        }
    }
}

fn append(text: &mut String, part: &str) -> Range<usize> {
    let start = text.len();
    text.push_str(part);
    start..text.len()
}

/// Creates a report from a check error, pointing into the listing of the
/// function it was found in.
pub fn check_error_to_report(error: &CheckError, listing: &Listing) -> Report<'static, FileSpan> {
    let mut colors = ColorGenerator::new();
    colors.next();

    let path = error.function().unwrap_or_default().to_string();
    let filespan = FileSpan::new(path.clone(), listing.span_of(error.location()));

    match error {
        CheckError::DuplicateDefinition { name } => {
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("DuplicateDefinition")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("{name:?} is already defined"))
                        .with_color(colors.next()),
                )
                .with_message("Function defined twice.")
                .finish()
        }
        CheckError::InvalidName { reason, .. } => Report::build(ReportKind::Error, filespan.clone())
            .with_code("InvalidName")
            .with_label(
                Label::new(filespan)
                    .with_message(*reason)
                    .with_color(colors.next()),
            )
            .finish(),
        CheckError::UndefinedReference { name, .. } => {
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("UndefinedReference")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("Function {name:?} not found."))
                        .with_color(colors.next()),
                )
                .with_note("functions must be defined before they are called")
                .finish()
        }
        CheckError::EffectMismatch {
            name,
            declared,
            registered,
            ..
        } => Report::build(ReportKind::Error, filespan.clone())
            .with_code("EffectMismatch")
            .with_label(
                Label::new(filespan)
                    .with_message(format!("this call assumes {name:?} has effect {declared}"))
                    .with_color(colors.next()),
            )
            .with_message(format!("{name:?} is defined as {registered}"))
            .finish(),
        CheckError::TypeMismatch {
            expected,
            found,
            generic,
            ..
        } => {
            let message = match generic {
                Some(generic) => format!(
                    "Generic T{generic} was bound to '{expected}' but this value is '{found}'"
                ),
                None => format!("Unexpected type '{found}', expected '{expected}'"),
            };
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("TypeMismatch")
                .with_label(
                    Label::new(filespan)
                        .with_message(message)
                        .with_color(colors.next()),
                )
                .with_message(format!("expected type {expected}"))
                .finish()
        }
        CheckError::UnboundGeneric { generic, .. } => {
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("UnboundGeneric")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("T{generic} is produced but never consumed"))
                        .with_color(colors.next()),
                )
                .finish()
        }
        CheckError::StackImbalance {
            kind,
            expected,
            found,
            ..
        } => {
            let message = match kind {
                Imbalance::Underflow => {
                    format!("needs {expected} values but only {found} are on the stack")
                }
                Imbalance::Leftover => {
                    format!("declared {expected} values but {found} are left on the stack")
                }
            };
            let mut report = Report::build(ReportKind::Error, filespan.clone())
                .with_code("StackImbalance")
                .with_label(
                    Label::new(filespan)
                        .with_message(message)
                        .with_color(colors.next()),
                );
            if error.location() != Some(Location::Exit) {
                report = report.with_label(
                    Label::new(FileSpan::new(path, listing.exit.clone()))
                        .with_message("function exit declared here")
                        .with_color(colors.next()),
                );
            }
            report.finish()
        }
        CheckError::SignatureError { function, found } => {
            Report::build(ReportKind::Error, filespan.clone())
                .with_code("SignatureError")
                .with_label(
                    Label::new(filespan)
                        .with_message(format!("declared as {found}"))
                        .with_color(colors.next()),
                )
                .with_message(format!("wrong function type for {function:?}, should be ( -- int )"))
                .finish()
        }
        CheckError::MissingEntryPoint => Report::build(ReportKind::Error, filespan)
            .with_code("MissingEntryPoint")
            .with_message("No entry point function defined.")
            .finish(),
    }
}
