use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::naming::titleize;

/// Parameter list shared by render and block functions.
pub const SIGNATURE: &str = "(env: &stick::Env, output: &mut dyn io::Write, ctx: &stick::Context)";

/// Identifies a block function: the inheritance root it was compiled for
/// and the block's name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub root: String,
    pub name: String,
}

impl BlockKey {
    pub fn new(root: impl Into<String>, name: impl Into<String>) -> Self {
        BlockKey {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn function_name(&self) -> String {
        format!("block{}{}", titleize(&self.root), titleize(&self.name))
    }
}

/// The body of one top-level template's render function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFunction {
    pub template: String,
    pub body: String,
}

impl RenderFunction {
    pub fn function_name(&self) -> String {
        format!("Template{}", titleize(&self.template))
    }
}

/// Everything produced by a generate call, ready to be written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledUnit {
    /// `use` paths, kept sorted.
    pub imports: BTreeSet<String>,
    pub blocks: BTreeMap<BlockKey, String>,
    pub templates: Vec<RenderFunction>,
}

impl CompiledUnit {
    /// Fold `other` into this unit. Blocks registered by `other` replace
    /// blocks with the same key.
    pub fn merge(&mut self, other: CompiledUnit) {
        self.imports.extend(other.imports);
        self.blocks.extend(other.blocks);
        self.templates.extend(other.templates);
    }

    pub fn render_function_names(&self) -> Vec<String> {
        self.templates.iter().map(RenderFunction::function_name).collect()
    }

    pub fn block_function_names(&self) -> Vec<String> {
        self.blocks.keys().map(BlockKey::function_name).collect()
    }

    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// Code generated by stickgen. DO NOT EDIT.")?;
        writeln!(f)?;
        for path in &self.imports {
            writeln!(f, "#[allow(unused_imports)]")?;
            writeln!(f, "use {};", path)?;
        }

        for (key, body) in &self.blocks {
            writeln!(f)?;
            writeln!(f, "#[allow(non_snake_case, unused_variables, dead_code)]")?;
            writeln!(f, "fn {}{} {{", key.function_name(), SIGNATURE)?;
            write!(f, "{}", body)?;
            writeln!(f, "}}")?;
        }

        for template in &self.templates {
            writeln!(f)?;
            writeln!(f, "#[allow(non_snake_case, unused_variables)]")?;
            writeln!(f, "pub fn {}{} {{", template.function_name(), SIGNATURE)?;
            write!(f, "{}", template.body)?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
