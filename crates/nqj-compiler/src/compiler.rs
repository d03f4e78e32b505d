//! Compilation driver.

use nqj_core::Diagnostics;
use nqj_ir::Module;
use nqj_parser::Program;

use crate::check::{Analysis, Analyzer};
use crate::translate;

/// Options controlling compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Emit a `Comment` instruction with the source line before each statement.
    pub emit_comments: bool,
    /// Name of the builtin `int -> int` print function.
    pub print_function: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            emit_comments: false,
            print_function: "printInt".to_string(),
        }
    }
}

/// Outcome of compiling one program.
#[derive(Debug)]
pub struct CompilationResult {
    /// Everything analysis reported, in the order it was found.
    pub diagnostics: Diagnostics,
    /// The generated module; present iff `diagnostics` is empty.
    pub module: Option<Module>,
}

impl CompilationResult {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_result(self) -> Result<Module, Diagnostics> {
        match self.module {
            Some(module) if self.diagnostics.is_empty() => Ok(module),
            _ => Err(self.diagnostics),
        }
    }
}

/// Analyzes programs and lowers accepted ones to IR.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Run name and type analysis only.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze<'ast>(&self, program: Program<'ast>) -> Analysis<'ast> {
        tracing::debug!(
            classes = program.classes.len(),
            functions = program.functions.len(),
            "analyzing program"
        );
        Analyzer::new(program, &self.options.print_function).run()
    }

    /// Analyze `program` and, when it is accepted, translate it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, program: Program<'_>) -> CompilationResult {
        let analysis = self.analyze(program);
        if !analysis.is_success() {
            tracing::debug!(
                diagnostics = analysis.diagnostics.len(),
                "program rejected"
            );
            return CompilationResult {
                diagnostics: analysis.diagnostics,
                module: None,
            };
        }

        let module = translate::translate(program, &analysis, &self.options);
        tracing::debug!(
            structs = module.structs().len(),
            procedures = module.procedures().len(),
            "program compiled"
        );
        CompilationResult {
            diagnostics: analysis.diagnostics,
            module: Some(module),
        }
    }
}
