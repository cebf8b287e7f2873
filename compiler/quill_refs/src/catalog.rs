use quill_ir::BinaryModule;

use crate::ReferenceName;

/// A resolved reference library: its canonical name and image bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceModule {
    pub name: ReferenceName,
    pub module: BinaryModule,
}

impl ReferenceModule {
    pub fn new(name: ReferenceName, module: BinaryModule) -> Self {
        ReferenceModule { name, module }
    }
}

/// Ordered set of resolved reference libraries, keyed by canonical name.
///
/// Each name appears at most once; the first module recorded for a name
/// wins and is never replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceCatalog {
    modules: Vec<ReferenceModule>,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        ReferenceCatalog::default()
    }

    /// Build a catalog from modules, dropping later duplicates of a name.
    pub fn from_modules(modules: impl IntoIterator<Item = ReferenceModule>) -> Self {
        let mut catalog = ReferenceCatalog::new();
        for module in modules {
            catalog.append(module);
        }
        catalog
    }

    /// Append a module unless its name is already present.
    ///
    /// Returns `false` if the name was already cataloged.
    pub(crate) fn append(&mut self, module: ReferenceModule) -> bool {
        if self.contains(module.name.as_str()) {
            return false;
        }
        self.modules.push(module);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceModule> {
        self.modules.iter().find(|m| m.name.as_str() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceModule> {
        self.modules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &ReferenceName> {
        self.modules.iter().map(|m| &m.name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<'a> IntoIterator for &'a ReferenceCatalog {
    type Item = &'a ReferenceModule;
    type IntoIter = std::slice::Iter<'a, ReferenceModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}
