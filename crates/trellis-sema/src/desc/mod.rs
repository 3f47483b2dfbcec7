//! The resolved, type-checked representation of declarations.
//!
//! A descriptor is either one of the reserved [`Builtin`]s or a [`Node`]
//! of the tree built for a file. Nodes are allocated as shells while
//! their declarations are walked, then populated attribute by attribute
//! as the compilation phases run, and never change afterwards. Children
//! hold weak links to their parent; a file owns everything beneath it.

mod layout;
mod ty;
mod value;
mod view;

pub use layout::{
    DataSectionSize, DataSize, FieldOffset, FieldSize, StructLayout, UnionLayout,
};
pub use ty::Type;
pub use value::Value;
pub use view::{
    AnnotationDesc, ConstantDesc, EnumDesc, EnumerantDesc, FieldDesc, FileDesc, InterfaceDesc,
    MethodDesc, StructDesc, UnionDesc,
};

use std::{
    cell::{Cell, OnceCell, RefCell},
    fmt,
    hash::{Hash, Hasher},
    rc::{Rc, Weak},
    sync::Arc,
};

use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use trellis_ast::{DeclKind, FixedSpec, Name};
use trellis_span::{Loc, Located};

use crate::builtin::Builtin;

/// Bindings of a scope, one per name, in declaration order.
pub type MemberMap = IndexMap<String, Node>;

/// Compiled annotations of one declaration, keyed by the id of the
/// annotation declaration that was applied.
pub type AnnotationMap = std::collections::BTreeMap<String, (Node, Value)>;

/// Any descriptor lookup can produce.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Desc {
    Builtin(Builtin),
    Node(Node),
}

impl Desc {
    /// The user-facing name of the descriptor.
    pub fn name(&self) -> &str {
        match self {
            Desc::Builtin(builtin) => builtin.name(),
            Desc::Node(node) => node.name(),
        }
    }
}

/// Tracks the resolution of a `using` alias, so the chase through alias
/// chains terminates even when they are circular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AliasState {
    #[default]
    Pending,
    InProgress,
    Done,
}

/// A descriptor node. Cheap to clone; identity is the allocation, so two
/// handles compare equal exactly when they denote the same declaration.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

pub(crate) struct NodeData {
    kind: DeclKind,
    name: Located<String>,
    parent: Weak<NodeData>,
    ordinal: Option<Located<u32>>,
    fixed: Option<Located<FixedSpec>>,
    targets: Vec<DeclKind>,
    misplaced: bool,

    alias_target: Option<Name>,
    alias_state: Cell<AliasState>,
    alias: RefCell<Option<Desc>>,

    children: OnceCell<Vec<Node>>,
    members: OnceCell<MemberMap>,
    imports: OnceCell<IndexMap<String, FileDesc>>,
    ty: OnceCell<Option<Type>>,
    layout: OnceCell<StructLayout>,
    union_layout: OnceCell<UnionLayout>,
    id: OnceCell<Option<Arc<str>>>,
    value: OnceCell<Option<Value>>,
    annotations: OnceCell<AnnotationMap>,
    runtime_imports: OnceCell<Vec<FileDesc>>,
}

/// Everything known about a declaration before any compilation phase has
/// run: the shell the phases fill in.
pub(crate) struct ShellInit {
    pub kind: DeclKind,
    pub name: Located<String>,
    pub ordinal: Option<Located<u32>>,
    pub fixed: Option<Located<FixedSpec>>,
    pub targets: Vec<DeclKind>,
    pub misplaced: bool,
    pub alias_target: Option<Name>,
}

impl ShellInit {
    pub fn new(kind: DeclKind, name: Located<String>) -> Self {
        Self {
            kind,
            name,
            ordinal: None,
            fixed: None,
            targets: Vec::new(),
            misplaced: false,
            alias_target: None,
        }
    }
}

impl Node {
    pub(crate) fn shell(parent: Option<&Node>, init: ShellInit) -> Node {
        Node(Rc::new(NodeData {
            kind: init.kind,
            name: init.name,
            parent: parent.map(|p| Rc::downgrade(&p.0)).unwrap_or_default(),
            ordinal: init.ordinal,
            fixed: init.fixed,
            targets: init.targets,
            misplaced: init.misplaced,
            alias_target: init.alias_target,
            alias_state: Cell::new(AliasState::Pending),
            alias: RefCell::new(None),
            children: OnceCell::new(),
            members: OnceCell::new(),
            imports: OnceCell::new(),
            ty: OnceCell::new(),
            layout: OnceCell::new(),
            union_layout: OnceCell::new(),
            id: OnceCell::new(),
            value: OnceCell::new(),
            annotations: OnceCell::new(),
            runtime_imports: OnceCell::new(),
        }))
    }

    pub fn kind(&self) -> DeclKind {
        self.0.kind
    }

    pub fn name(&self) -> &str {
        &self.0.name.0
    }

    pub fn loc(&self) -> Loc {
        self.0.name.1
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.upgrade().map(Node)
    }

    /// The file this descriptor ultimately belongs to.
    pub fn file(&self) -> Node {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// The explicit declaration number, for the kinds that carry one.
    pub fn ordinal(&self) -> Option<u32> {
        self.0.ordinal.map(|(number, _)| number)
    }

    pub(crate) fn ordinal_loc(&self) -> Option<Loc> {
        self.0.ordinal.map(|(_, loc)| loc)
    }

    /// The declared fixed wire footprint, for structs that have one.
    pub fn fixed(&self) -> Option<FixedSpec> {
        self.0.fixed.map(|(spec, _)| spec)
    }

    pub(crate) fn fixed_loc(&self) -> Option<Loc> {
        self.0.fixed.map(|(_, loc)| loc)
    }

    /// The declaration kinds an annotation declaration may target.
    pub fn targets(&self) -> &[DeclKind] {
        &self.0.targets
    }

    pub(crate) fn is_misplaced(&self) -> bool {
        self.0.misplaced
    }

    /// The scope's bindings, one per name.
    pub fn members(&self) -> &MemberMap {
        self.0.members.get().expect("members not declared")
    }

    /// Direct member lookup, descending through `using` aliases. Returns
    /// nothing for names bound to aliases that failed to resolve.
    pub fn member(&self, name: &str) -> Option<Desc> {
        let node = self.members().get(name)?;
        if node.kind() == DeclKind::Using {
            node.alias()
        } else {
            Some(Desc::Node(node.clone()))
        }
    }

    /// All child shells in declaration order, duplicates included. The
    /// member map only keeps the first binding per name.
    pub(crate) fn children(&self) -> &[Node] {
        self.0.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// The id attached via the reserved `id` annotation.
    pub fn id(&self) -> Option<&str> {
        self.0.id.get().and_then(|id| id.as_deref())
    }

    /// The compiled type, for fields, constants, parameters, annotation
    /// declarations and method returns. `None` when the type failed to
    /// compile (the diagnostics already say why).
    pub fn ty(&self) -> Option<&Type> {
        self.0.ty.get().and_then(Option::as_ref)
    }

    /// The compiled constant value or default.
    pub fn value(&self) -> Option<&Value> {
        self.0.value.get().and_then(Option::as_ref)
    }

    pub fn annotations(&self) -> &AnnotationMap {
        self.0.annotations.get().expect("annotations not compiled")
    }

    /// The packed layout, for structs.
    pub fn layout(&self) -> Option<&StructLayout> {
        self.0.layout.get()
    }

    /// The tag position and discriminant table, for unions.
    pub fn union_layout(&self) -> Option<&UnionLayout> {
        self.0.union_layout.get()
    }

    pub(crate) fn imports(&self) -> Option<&IndexMap<String, FileDesc>> {
        self.0.imports.get()
    }

    pub(crate) fn runtime_imports(&self) -> &[FileDesc] {
        self.0
            .runtime_imports
            .get()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // Phase write access. Each attribute is set exactly once.

    pub(crate) fn set_children(&self, children: Vec<Node>) {
        self.0
            .children
            .set(children)
            .unwrap_or_else(|_| panic!("children set twice"));
    }

    pub(crate) fn set_members(&self, members: MemberMap) {
        self.0
            .members
            .set(members)
            .unwrap_or_else(|_| panic!("members set twice"));
    }

    pub(crate) fn set_imports(&self, imports: IndexMap<String, FileDesc>) {
        self.0
            .imports
            .set(imports)
            .unwrap_or_else(|_| panic!("imports set twice"));
    }

    pub(crate) fn set_ty(&self, ty: Option<Type>) {
        self.0
            .ty
            .set(ty)
            .unwrap_or_else(|_| panic!("type set twice"));
    }

    pub(crate) fn set_layout(&self, layout: StructLayout) {
        self.0
            .layout
            .set(layout)
            .unwrap_or_else(|_| panic!("layout set twice"));
    }

    pub(crate) fn set_union_layout(&self, layout: UnionLayout) {
        self.0
            .union_layout
            .set(layout)
            .unwrap_or_else(|_| panic!("union layout set twice"));
    }

    pub(crate) fn set_id(&self, id: Option<Arc<str>>) {
        self.0.id.set(id).unwrap_or_else(|_| panic!("id set twice"));
    }

    pub(crate) fn set_value(&self, value: Option<Value>) {
        self.0
            .value
            .set(value)
            .unwrap_or_else(|_| panic!("value set twice"));
    }

    pub(crate) fn set_annotations(&self, annotations: AnnotationMap) {
        self.0
            .annotations
            .set(annotations)
            .unwrap_or_else(|_| panic!("annotations set twice"));
    }

    pub(crate) fn set_runtime_imports(&self, imports: Vec<FileDesc>) {
        self.0
            .runtime_imports
            .set(imports)
            .unwrap_or_else(|_| panic!("runtime imports set twice"));
    }

    // Alias plumbing, used by the resolution pass.

    pub(crate) fn alias_target(&self) -> Option<&Name> {
        self.0.alias_target.as_ref()
    }

    pub(crate) fn alias_state(&self) -> AliasState {
        self.0.alias_state.get()
    }

    pub(crate) fn set_alias_state(&self, state: AliasState) {
        self.0.alias_state.set(state);
    }

    /// The alias target once resolution is done; `None` for aliases that
    /// failed to resolve.
    pub fn alias(&self) -> Option<Desc> {
        self.0.alias.borrow().clone()
    }

    pub(crate) fn set_alias(&self, target: Option<Desc>) {
        *self.0.alias.borrow_mut() = target;
        self.0.alias_state.set(AliasState::Done);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}
