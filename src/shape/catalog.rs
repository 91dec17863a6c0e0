//! Catalog of wrapper shapes keyed by structural and exact signature.
//!
//! Every key maps to a slot holding at most one entry per declaring
//! interface, ordered by registration. Unscoped lookups resolve to the most
//! recently registered interface; scoped lookups pick the named one.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::{ReflectError, Result};
use crate::executable::Executable;
use crate::signature::{BindMode, ExactSignature, Signature, StructuralSignature};
use crate::value::{TypeKind, TypeToken};

use super::{InterfaceDecl, InvokerTag, ShapeDecl, ShapeMetadata};

#[derive(Debug, Default)]
struct Slot {
    entries: Vec<Arc<ShapeMetadata>>,
}

impl Slot {
    /// Insert or replace the entry of `shape`'s interface. Returns the
    /// replaced entry.
    fn put(&mut self, shape: Arc<ShapeMetadata>) -> Option<Arc<ShapeMetadata>> {
        let replaced = self
            .entries
            .iter()
            .position(|e| e.interface() == shape.interface())
            .map(|idx| self.entries.remove(idx));
        self.entries.push(shape);
        replaced
    }

    fn latest(&self) -> Option<&Arc<ShapeMetadata>> {
        self.entries.last()
    }

    fn scoped(&self, interface: TypeToken) -> Option<&Arc<ShapeMetadata>> {
        self.entries.iter().find(|e| e.interface() == interface)
    }
}

#[derive(Debug, Default)]
struct Tables {
    structural: HashMap<StructuralSignature, Slot>,
    exact: HashMap<ExactSignature, Slot>,
}

impl Tables {
    fn insert(&mut self, shape: Arc<ShapeMetadata>) {
        let replaced = match shape.tag() {
            InvokerTag::Generic => self
                .structural
                .entry(shape.structural())
                .or_default()
                .put(Arc::clone(&shape)),
            InvokerTag::Exact => self
                .exact
                .entry(shape.exact())
                .or_default()
                .put(Arc::clone(&shape)),
        };
        match replaced {
            Some(old) => log::warn!("wrapper shape {old} replaced by {shape}"),
            None => log::debug!("registered wrapper shape {shape}"),
        }
    }
}

/// Key a shape is catalogued under.
fn signature_of(shape: &ShapeMetadata) -> Signature {
    match shape.tag() {
        InvokerTag::Generic => Signature::Structural(shape.structural()),
        InvokerTag::Exact => Signature::Exact(shape.exact()),
    }
}

/// Outcome of probing a table with a sequence of candidate keys.
enum Probe {
    Found(Arc<ShapeMetadata>),
    /// Some key matched, but only on other interfaces.
    Elsewhere,
    Missing,
}

fn probe<K, I>(table: &HashMap<K, Slot>, keys: I, scope: Option<TypeToken>) -> Probe
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let mut elsewhere = false;
    for key in keys {
        let Some(slot) = table.get(&key) else {
            continue;
        };
        let hit = match scope {
            Some(interface) => slot.scoped(interface),
            None => slot.latest(),
        };
        match hit {
            Some(shape) => return Probe::Found(Arc::clone(shape)),
            None => elsewhere = true,
        }
    }
    if elsewhere {
        Probe::Elsewhere
    } else {
        Probe::Missing
    }
}

/// Thread-safe shape catalog.
#[derive(Debug, Default)]
pub struct ShapeCatalog {
    tables: RwLock<Tables>,
}

impl ShapeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every shape of an interface. Nothing is inserted unless all
    /// of them are valid.
    pub fn add_interface(&self, decl: InterfaceDecl) -> Result<usize> {
        if decl.kind() != TypeKind::Interface {
            return Err(ReflectError::not_interface(&decl.token()));
        }
        let token = decl.token();
        let count = self.add_methods(decl.into_shapes())?;
        log::debug!("added wrapper interface {token} with {count} shapes");
        Ok(count)
    }

    /// Register individual shapes, each carrying its declaring interface.
    pub fn add_methods<I>(&self, shapes: I) -> Result<usize>
    where
        I: IntoIterator<Item = ShapeDecl>,
    {
        let validated = shapes
            .into_iter()
            .map(|decl| ShapeMetadata::from_decl(&decl).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        let mut seen = HashSet::with_capacity(validated.len());
        if let Some(clash) = validated
            .iter()
            .find(|shape| !seen.insert((signature_of(shape), shape.interface())))
        {
            return Err(ReflectError::declaration(
                clash.interface().to_string(),
                clash.method_name(),
                format!(
                    "another shape of this interface is already keyed by {}",
                    signature_of(clash)
                ),
            ));
        }
        let count = validated.len();
        let mut tables = self.tables.write();
        for shape in validated {
            tables.insert(shape);
        }
        Ok(count)
    }

    /// Find the shape `target` binds to under `mode`, optionally restricted
    /// to shapes declared on `scope`.
    pub fn lookup(
        &self,
        target: &Executable,
        mode: BindMode,
        scope: Option<TypeToken>,
    ) -> Result<Arc<ShapeMetadata>> {
        let tables = self.tables.read();
        let probe = match mode {
            BindMode::Structural => probe(
                &tables.structural,
                StructuralSignature::candidates(target),
                scope,
            ),
            BindMode::Exact => probe(&tables.exact, ExactSignature::candidates(target), scope),
        };
        drop(tables);

        let signature = Signature::of_target(target, mode);
        log::trace!("lookup {} as {signature}", target.qualified_name());
        match (probe, scope) {
            (Probe::Found(shape), _) => Ok(shape),
            (Probe::Elsewhere, Some(scope)) => Err(ReflectError::ShapeMismatch {
                target: target.qualified_name().to_string(),
                scope,
                signature,
            }),
            (Probe::Elsewhere | Probe::Missing, _) => Err(ReflectError::NoShapeFound {
                target: target.qualified_name().to_string(),
                signature,
            }),
        }
    }

    /// Every catalogued shape `target` could bind to, in either mode.
    ///
    /// Each candidate key is read under its own short read lock when the
    /// iterator reaches it, so registrations made meanwhile may show up for
    /// keys not yet visited.
    pub fn shapes_for<'a>(
        &'a self,
        target: &Executable,
    ) -> impl Iterator<Item = Arc<ShapeMetadata>> + 'a {
        let keys: Vec<Signature> = StructuralSignature::candidates(target)
            .map(Signature::Structural)
            .chain(ExactSignature::candidates(target).map(Signature::Exact))
            .collect();
        keys.into_iter().flat_map(move |key| self.slot_entries(&key))
    }

    /// Entries under `key`, newest first.
    fn slot_entries(&self, key: &Signature) -> Vec<Arc<ShapeMetadata>> {
        let tables = self.tables.read();
        let slot = match key {
            Signature::Structural(key) => tables.structural.get(key),
            Signature::Exact(key) => tables.exact.get(key),
        };
        slot.map(|slot| slot.entries.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of catalogued shapes across both tables.
    #[must_use]
    pub fn len(&self) -> usize {
        let tables = self.tables.read();
        tables
            .structural
            .values()
            .chain(tables.exact.values())
            .map(|slot| slot.entries.len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    struct First;
    struct Second;

    #[derive(Debug, Default, Clone)]
    struct Target;

    fn getter_decl<W: 'static>() -> InterfaceDecl {
        InterfaceDecl::new::<W>().shape(ShapeDecl::generic("get").caller().returns_value())
    }

    fn getter_target() -> Executable {
        Executable::method("name", |_: &Target| String::from("t"))
    }

    #[test]
    fn test_failed_add_leaves_catalog_unchanged() {
        let catalog = ShapeCatalog::new();
        let decl = InterfaceDecl::new::<First>()
            .shape(ShapeDecl::generic("get").caller().returns_value())
            .shape(ShapeDecl::untagged("broken").caller());
        let err = catalog.add_interface(decl).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeDeclaration);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_class_cannot_declare_shapes() {
        let catalog = ShapeCatalog::new();
        let err = catalog
            .add_interface(getter_decl::<First>().with_kind(TypeKind::Class))
            .unwrap_err();
        assert!(err.to_string().contains("only interfaces"));
    }

    #[test]
    fn test_unscoped_lookup_prefers_latest_interface() {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        catalog.add_interface(getter_decl::<Second>()).unwrap();
        let shape = catalog
            .lookup(&getter_target(), BindMode::Structural, None)
            .unwrap();
        assert_eq!(shape.interface(), TypeToken::of::<Second>());

        let scoped = catalog
            .lookup(&getter_target(), BindMode::Structural, Some(TypeToken::of::<First>()))
            .unwrap();
        assert_eq!(scoped.interface(), TypeToken::of::<First>());
    }

    #[test]
    fn test_reregistering_replaces_entry() {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_scoped_lookup_reports_mismatch() {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        let err = catalog
            .lookup(&getter_target(), BindMode::Structural, Some(TypeToken::of::<Second>()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let setter = Executable::method("rename", |_: &Target, _n: String| ());
        let err = catalog
            .lookup(&setter, BindMode::Structural, Some(TypeToken::of::<Second>()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoShapeFound);
    }

    #[test]
    fn test_constructor_falls_back_to_caller_slot() {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        let ctor = Executable::constructor(Target::default);
        let shape = catalog.lookup(&ctor, BindMode::Structural, None).unwrap();
        assert_eq!(shape.method_name(), "get");

        catalog
            .add_interface(
                InterfaceDecl::new::<Second>()
                    .shape(ShapeDecl::generic("construct").returns_value()),
            )
            .unwrap();
        let shape = catalog.lookup(&ctor, BindMode::Structural, None).unwrap();
        assert_eq!(shape.method_name(), "construct");
        assert_eq!(catalog.shapes_for(&ctor).count(), 2);
    }

    #[test]
    fn test_exact_lookup_matches_types() {
        let catalog = ShapeCatalog::new();
        catalog
            .add_interface(
                InterfaceDecl::new::<First>()
                    .shape(ShapeDecl::exact("len").caller().param::<String>().returns::<usize>()),
            )
            .unwrap();
        let good = Executable::method("len", |_: &Target, s: String| s.len());
        let bad = Executable::method("len", |_: &Target, s: String| s.len() as u32);
        assert!(catalog.lookup(&good, BindMode::Exact, None).is_ok());
        assert_eq!(
            catalog.lookup(&bad, BindMode::Exact, None).unwrap_err().kind(),
            ErrorKind::NoShapeFound
        );
        assert!(catalog.lookup(&good, BindMode::Structural, None).is_err());
    }

    #[test]
    fn test_equal_keys_within_one_interface_are_rejected() {
        let catalog = ShapeCatalog::new();
        let decl = InterfaceDecl::new::<First>()
            .shape(ShapeDecl::generic("first").caller().returns_value())
            .shape(ShapeDecl::generic("second").caller().returns_value());
        let err = catalog.add_interface(decl).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeDeclaration);
        assert!(err.to_string().contains("second"), "{err}");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_equal_structure_in_both_tables_is_accepted() {
        let catalog = ShapeCatalog::new();
        let decl = InterfaceDecl::new::<First>()
            .shape(ShapeDecl::generic("get").caller().returns_value())
            .shape(ShapeDecl::exact("name").caller().returns::<String>());
        assert_eq!(catalog.add_interface(decl).unwrap(), 2);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.shapes_for(&getter_target()).count(), 2);
    }

    #[test]
    fn test_shapes_for_reads_keys_lazily() {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(getter_decl::<First>()).unwrap();
        let ctor = Executable::constructor(Target::default);
        let mut listing = catalog.shapes_for(&ctor);
        catalog
            .add_interface(
                InterfaceDecl::new::<Second>()
                    .shape(ShapeDecl::generic("construct").returns_value()),
            )
            .unwrap();
        // the caller-less key is visited first and sees the later registration
        assert_eq!(listing.next().unwrap().method_name(), "construct");
        assert_eq!(listing.next().unwrap().method_name(), "get");
        assert!(listing.next().is_none());
    }
}
