use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info, warn};
use stick_syntax::{Body, Expr, Loader, Module, Node, Pos};

use crate::error::{GenerateError, ReferenceKind};
use crate::expr::{Evaluated, Scope, translate};
use crate::naming::local_ident;
use crate::output::{BlockKey, CompiledUnit, RenderFunction};

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Crate path the generated code imports as `stick`.
    pub runtime_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            runtime_crate: "stick_runtime".to_string(),
        }
    }
}

/// Compiles templates into render functions.
///
/// The generator holds no per-compile state; every `generate` call starts
/// from a fresh context, so one generator can be reused.
pub struct Generator<L> {
    loader: L,
    config: GeneratorConfig,
}

impl<L: Loader> Generator<L> {
    pub fn new(loader: L) -> Self {
        Generator::with_config(loader, GeneratorConfig::default())
    }

    pub fn with_config(loader: L, config: GeneratorConfig) -> Self {
        Generator { loader, config }
    }

    /// Compile `name`, its ancestors and everything it includes.
    pub fn generate(&self, name: &str) -> Result<CompiledUnit, GenerateError> {
        let mut ctx = GenerationContext::new(&self.loader, &self.config);
        ctx.compile_template(name)?;
        let unit = ctx.finish(name);
        info!(
            "generated `{}` with {} block function(s)",
            name,
            unit.blocks.len()
        );
        debug!("block functions: [{}]", unit.block_function_names().join(", "));
        Ok(unit)
    }

    /// Compile several templates into one unit with a shared import list.
    /// Repeated names are compiled once.
    pub fn generate_all<I, S>(&self, names: I) -> Result<CompiledUnit, GenerateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unit = CompiledUnit::default();
        let mut seen = HashSet::new();
        let mut functions = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name.to_string()) {
                warn!("skipping duplicate template `{}`", name);
                continue;
            }
            let compiled = self.generate(name)?;
            for function in compiled.render_function_names() {
                if !functions.insert(function.clone()) {
                    warn!("`{}` maps to `{}`, which is already defined", name, function);
                }
            }
            unit.merge(compiled);
        }
        Ok(unit)
    }
}

/// A template on the inheritance stack.
struct Frame {
    name: String,
    extends: bool,
}

/// State for one in-flight generate call.
struct GenerationContext<'g> {
    loader: &'g dyn Loader,
    /// Templates being compiled; the bottom entry is the inheritance root.
    stack: Vec<Frame>,
    /// Number of block bodies currently being captured.
    capturing: usize,
    indent: usize,
    scope: Scope,
    imports: BTreeSet<String>,
    blocks: BTreeMap<BlockKey, String>,
    out: String,
}

impl<'g> GenerationContext<'g> {
    fn new(loader: &'g dyn Loader, config: &GeneratorConfig) -> Self {
        let mut imports = BTreeSet::new();
        imports.insert("std::io".to_string());
        imports.insert(format!("{} as stick", config.runtime_crate));
        GenerationContext {
            loader,
            stack: Vec::new(),
            capturing: 0,
            indent: 1,
            scope: Scope::new(),
            imports,
            blocks: BTreeMap::new(),
            out: String::new(),
        }
    }

    fn finish(self, name: &str) -> CompiledUnit {
        CompiledUnit {
            imports: self.imports,
            blocks: self.blocks,
            templates: vec![RenderFunction {
                template: name.to_string(),
                body: self.out,
            }],
        }
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }

    fn open_scope(&mut self, header: &str) {
        self.line(header);
        self.indent += 1;
    }

    fn close_scope(&mut self, trailer: &str) {
        self.indent -= 1;
        self.line(trailer);
    }

    fn trace(&mut self, pos: Pos) {
        let comment = format!(
            "// line {}, offset {} in {}",
            pos.line,
            pos.offset,
            self.current()
        );
        self.line(&comment);
    }

    fn write_value(&mut self, value: &str) {
        self.line(&format!("let _ = write!(output, \"{{}}\", {});", value));
    }

    /// Emit the preamble of `value` inside a fresh block scope and return
    /// how many scopes were opened. A fallible value also gets its success
    /// guard.
    fn open_preamble(&mut self, value: &Evaluated) -> usize {
        match value {
            Evaluated::Value(_) => 0,
            Evaluated::Scoped { preamble, .. } => {
                self.open_scope("{");
                self.lines(preamble);
                1
            }
            Evaluated::Fallible { preamble, binding } => {
                self.open_scope("{");
                self.lines(preamble);
                self.open_scope(&format!("if let Ok({0}) = {0} {{", binding));
                2
            }
        }
    }

    fn close_preamble(&mut self, opened: usize) {
        for _ in 0..opened {
            self.close_scope("}");
        }
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    fn current(&self) -> &str {
        self.stack.last().map(|frame| frame.name.as_str()).unwrap_or_default()
    }

    fn root(&self) -> &str {
        self.stack.first().map(|frame| frame.name.as_str()).unwrap_or_default()
    }

    fn compile_template(&mut self, name: &str) -> Result<(), GenerateError> {
        if self.stack.iter().any(|frame| frame.name == name) {
            let mut chain: Vec<String> = self.stack.iter().map(|frame| frame.name.clone()).collect();
            chain.push(name.to_string());
            return Err(GenerateError::CycleDetected { chain });
        }

        debug!("compiling `{}` (depth {})", name, self.stack.len());
        let source = self.loader.load(name)?;
        let module = stick_syntax::parse(&source).map_err(|error| GenerateError::Syntax {
            name: name.to_string(),
            source,
            error,
        })?;

        self.stack.push(Frame {
            name: name.to_string(),
            extends: module.parent.is_some(),
        });
        let result = self.compile_module(&module);
        self.stack.pop();
        result
    }

    fn compile_module(&mut self, module: &Module) -> Result<(), GenerateError> {
        if let Some(parent) = &module.parent {
            let parent = self.static_reference(parent, ReferenceKind::Extends)?;
            debug!("`{}` extends `{}`", self.current(), parent);
            self.compile_template(&parent)?;
        }
        self.walk_body(&module.body)
    }

    fn static_reference(&self, target: &Expr, kind: ReferenceKind) -> Result<String, GenerateError> {
        match target.as_static_str() {
            Some(name) => Ok(name.to_string()),
            None => Err(GenerateError::UnresolvableReference {
                template: self.current().to_string(),
                kind,
                target: target.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn walk_body(&mut self, body: &Body) -> Result<(), GenerateError> {
        for node in &body.nodes {
            self.walk(node)?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &Node) -> Result<(), GenerateError> {
        match node {
            Node::Text { data, pos } => {
                self.imports.insert("std::io::Write".to_string());
                self.trace(*pos);
                self.line(&format!("let _ = output.write_all({:?}.as_bytes());", data));
                Ok(())
            }
            Node::Print { expr, pos } => {
                let value = translate(expr, &mut self.scope)?;
                self.imports.insert("std::io::Write".to_string());
                self.trace(*pos);
                let opened = self.open_preamble(&value);
                self.write_value(value.result_ref());
                self.close_preamble(opened);
                Ok(())
            }
            Node::Block { name, body, pos } => self.walk_block(name, body, *pos),
            Node::For {
                key,
                val,
                iterable,
                body,
                pos,
            } => self.walk_for(key.as_deref(), val, iterable, body, *pos),
            Node::If {
                cond,
                body,
                alternate,
                pos,
            } => self.walk_if(cond, body, alternate, *pos),
            Node::Include { target, .. } => {
                let name = self.static_reference(target, ReferenceKind::Include)?;
                debug!("`{}` includes `{}`", self.current(), name);
                self.compile_template(&name)
            }
        }
    }

    /// Register the block under the inheritance root, keeping the most
    /// derived body. A call is emitted only when the current template has
    /// no parent or when the block sits inside another block's body.
    fn walk_block(&mut self, name: &str, body: &Body, pos: Pos) -> Result<(), GenerateError> {
        let key = BlockKey::new(self.root(), name);
        let captured = self.capture(body)?;
        if self.blocks.insert(key.clone(), captured).is_some() {
            debug!("block `{}` redefined by `{}`", name, self.current());
        } else {
            debug!("registered block `{}` from `{}`", name, self.current());
        }

        // Top-level blocks of a template with a parent are emitted where
        // the ancestor places them.
        let extends = self.stack.last().is_some_and(|frame| frame.extends);
        if !extends || self.capturing > 0 {
            self.trace(pos);
            self.line(&format!("{}(env, output, ctx);", key.function_name()));
        }
        Ok(())
    }

    /// Compile `body` into a separate buffer at function level, with no
    /// loop variables in scope.
    fn capture(&mut self, body: &Body) -> Result<String, GenerateError> {
        let out = std::mem::take(&mut self.out);
        let indent = std::mem::replace(&mut self.indent, 1);
        let locals = self.scope.take_locals();

        self.capturing += 1;
        let result = self.walk_body(body);
        self.capturing -= 1;

        let captured = std::mem::replace(&mut self.out, out);
        self.indent = indent;
        self.scope.restore_locals(locals);
        result.map(|()| captured)
    }

    fn walk_for(
        &mut self,
        key: Option<&str>,
        val: &str,
        iterable: &Expr,
        body: &Body,
        pos: Pos,
    ) -> Result<(), GenerateError> {
        let iterable = translate(iterable, &mut self.scope)?;
        self.trace(pos);
        let opened = self.open_preamble(&iterable);
        // A loop variable named `loop` hides the loop state.
        let loop_state = key != Some("loop") && val != "loop";
        self.open_scope(&format!(
            "let _ = stick::iterate(&{}, |{}, {}, {}| {{",
            iterable.result_ref(),
            key.map_or_else(|| "_".to_string(), local_ident),
            local_ident(val),
            if loop_state { "__loop" } else { "_" },
        ));
        if loop_state {
            self.line(&format!("let {} = stick::Value::from(__loop);", local_ident("loop")));
            self.scope.bind("loop");
        }
        if let Some(key) = key {
            self.scope.bind(key);
        }
        self.scope.bind(val);
        let result = self.walk_body(body);
        self.scope.unbind(val);
        if let Some(key) = key {
            self.scope.unbind(key);
        }
        if loop_state {
            self.scope.unbind("loop");
        }
        result?;

        self.line("Ok(false)");
        self.close_scope("});");
        self.close_preamble(opened);
        Ok(())
    }

    fn walk_if(&mut self, cond: &Expr, body: &Body, alternate: &Body, pos: Pos) -> Result<(), GenerateError> {
        let cond = translate(cond, &mut self.scope)?;
        self.trace(pos);
        let opened = match &cond {
            Evaluated::Fallible { preamble, binding } => {
                self.open_scope("{");
                self.lines(preamble);
                self.open_scope(&format!(
                    "if {}.as_ref().is_ok_and(stick::coerce_bool) {{",
                    binding
                ));
                1
            }
            resolved => {
                let opened = self.open_preamble(resolved);
                self.open_scope(&format!("if stick::coerce_bool(&{}) {{", resolved.result_ref()));
                opened
            }
        };

        self.walk_body(body)?;
        if !alternate.is_empty() {
            self.close_scope("} else {");
            self.indent += 1;
            self.walk_body(alternate)?;
        }
        self.close_scope("}");
        self.close_preamble(opened);
        Ok(())
    }
}
