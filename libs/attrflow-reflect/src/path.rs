use std::fmt;

/// One step of an [`AttrPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Named attribute or object field (`.name`).
    AttributeName(String),
    /// Position in a list (`[3]`).
    ListIndex(usize),
    /// Key in a map (`["key"]`).
    MapKey(String),
}

/// Structural location of a value inside a configuration.
///
/// Opaque to the converters: they only derive child paths and thread
/// them into diagnostics.
///
/// Display form: `block.items[0]["key"]`. The empty path displays as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttrPath {
    steps: Vec<PathStep>,
}

impl AttrPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive the path of a named attribute below `self`.
    pub fn at_name(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::AttributeName(name.into()))
    }

    pub fn at_list_index(&self, index: usize) -> Self {
        self.with_step(PathStep::ListIndex(index))
    }

    pub fn at_map_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::MapKey(key.into()))
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("(root)");
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::AttributeName(name) if i == 0 => write!(f, "{name}")?,
                PathStep::AttributeName(name) => write!(f, ".{name}")?,
                PathStep::ListIndex(index) => write!(f, "[{index}]")?,
                PathStep::MapKey(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}
