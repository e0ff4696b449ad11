//! Simulated VCL for tests and embedding.
//!
//! [`InMemoryVcl`] hands out fake but distinct addresses for repositories,
//! references and objects, and remembers the owner of each child. Nothing is
//! ever really dereferenced. Instead of crashing on misuse it records a
//! [`Violation`], so tests can assert that a sequence of wraps and releases
//! freed every pointer exactly once and in an order the real library would
//! accept.

use std::cell::RefCell;
use std::collections::HashMap;

use tether_types::{ObjectType, RawPtr, VclError};

use crate::traits::Vcl;

const BASE_ADDR: usize = 0x7f00_0000_1000;
const ADDR_STRIDE: usize = 0x40;

/// Which free function was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FreeClass {
    Object,
    Reference,
    Repository,
}

/// One call to a VCL free function, in call order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeEvent {
    pub ptr: RawPtr,
    pub class: FreeClass,
}

/// A breach of the VCL's calling contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// A pointer was freed a second time.
    DoubleFree(RawPtr),
    /// A freed pointer was passed to an accessor.
    UseAfterFree(RawPtr),
    /// A pointer this VCL never handed out was used.
    UnknownPointer(RawPtr),
    /// A pointer was freed with the free function of another class.
    WrongFree {
        ptr: RawPtr,
        expected: FreeClass,
        actual: FreeClass,
    },
    /// A repository was freed while one of its children was still live.
    OwnerFreedFirst { owner: RawPtr, child: RawPtr },
}

#[derive(Clone, Copy, Debug)]
enum NodeClass {
    Repository,
    Reference { owner: RawPtr },
    Object { ty: ObjectType, owner: RawPtr },
}

impl NodeClass {
    fn free_class(&self) -> FreeClass {
        match self {
            Self::Repository => FreeClass::Repository,
            Self::Reference { .. } => FreeClass::Reference,
            Self::Object { .. } => FreeClass::Object,
        }
    }

    fn owner(&self) -> Option<RawPtr> {
        match self {
            Self::Repository => None,
            Self::Reference { owner } | Self::Object { owner, .. } => Some(*owner),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    class: NodeClass,
    live: bool,
}

/// An in-memory implementation of [`Vcl`].
#[derive(Debug, Default)]
pub struct InMemoryVcl {
    next: usize,
    nodes: HashMap<RawPtr, Node>,
    frees: Vec<FreeEvent>,
    violations: RefCell<Vec<Violation>>,
    last_error: Option<VclError>,
}

impl InMemoryVcl {
    /// Create an empty VCL.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, class: NodeClass) -> RawPtr {
        let ptr = RawPtr::from_addr(BASE_ADDR + self.next * ADDR_STRIDE);
        self.next += 1;
        self.nodes.insert(ptr, Node { class, live: true });
        ptr
    }

    /// Open a new repository.
    pub fn open_repository(&mut self) -> RawPtr {
        self.allocate(NodeClass::Repository)
    }

    /// Look up a reference owned by `repository`.
    pub fn lookup_reference(&mut self, repository: RawPtr) -> RawPtr {
        self.allocate(NodeClass::Reference { owner: repository })
    }

    /// Look up an object of type `ty` owned by `repository`.
    pub fn lookup_object(&mut self, repository: RawPtr, ty: ObjectType) -> RawPtr {
        self.allocate(NodeClass::Object {
            ty,
            owner: repository,
        })
    }

    /// Record `error` as the last error, as a failing VCL call would.
    pub fn fail_with(&mut self, error: VclError) {
        self.last_error = Some(error);
    }

    /// Forget the last error.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Returns `true` if `ptr` was handed out and not yet freed.
    pub fn is_live(&self, ptr: RawPtr) -> bool {
        self.nodes.get(&ptr).is_some_and(|node| node.live)
    }

    /// Number of pointers handed out and not yet freed.
    pub fn live_count(&self) -> usize {
        self.nodes.values().filter(|node| node.live).count()
    }

    /// Every free call so far, in call order.
    pub fn frees(&self) -> &[FreeEvent] {
        &self.frees
    }

    /// How many times `ptr` has been freed.
    pub fn free_count(&self, ptr: RawPtr) -> usize {
        self.frees.iter().filter(|event| event.ptr == ptr).count()
    }

    /// Position of the free of `ptr` in the free log.
    pub fn free_position(&self, ptr: RawPtr) -> Option<usize> {
        self.frees.iter().position(|event| event.ptr == ptr)
    }

    /// Every contract violation observed so far.
    pub fn violations(&self) -> Vec<Violation> {
        self.violations.borrow().clone()
    }

    fn violate(&self, violation: Violation) {
        tracing::warn!(?violation, "VCL contract violation");
        self.violations.borrow_mut().push(violation);
    }

    fn accessed(&self, ptr: RawPtr) -> Option<NodeClass> {
        match self.nodes.get(&ptr) {
            None => {
                self.violate(Violation::UnknownPointer(ptr));
                None
            }
            Some(node) => {
                if !node.live {
                    self.violate(Violation::UseAfterFree(ptr));
                }
                Some(node.class)
            }
        }
    }

    fn free(&mut self, ptr: RawPtr, class: FreeClass) {
        self.frees.push(FreeEvent { ptr, class });

        let Some(node) = self.nodes.get(&ptr).copied() else {
            self.violate(Violation::UnknownPointer(ptr));
            return;
        };
        if !node.live {
            self.violate(Violation::DoubleFree(ptr));
            return;
        }
        let expected = node.class.free_class();
        if expected != class {
            self.violate(Violation::WrongFree {
                ptr,
                expected,
                actual: class,
            });
        }
        if class == FreeClass::Repository {
            let live_child = self
                .nodes
                .iter()
                .find(|(_, child)| child.live && child.class.owner() == Some(ptr))
                .map(|(child_ptr, _)| *child_ptr);
            if let Some(child) = live_child {
                self.violate(Violation::OwnerFreedFirst { owner: ptr, child });
            }
        }
        if let Some(node) = self.nodes.get_mut(&ptr) {
            node.live = false;
        }
    }
}

impl Vcl for InMemoryVcl {
    unsafe fn object_type(&self, object: RawPtr) -> ObjectType {
        match self.accessed(object) {
            Some(NodeClass::Object { ty, .. }) => ty,
            _ => ObjectType::Invalid,
        }
    }

    unsafe fn object_owner(&self, object: RawPtr) -> RawPtr {
        match self.accessed(object) {
            Some(NodeClass::Object { owner, .. }) => owner,
            _ => RawPtr::null(),
        }
    }

    unsafe fn reference_owner(&self, reference: RawPtr) -> RawPtr {
        match self.accessed(reference) {
            Some(NodeClass::Reference { owner }) => owner,
            _ => RawPtr::null(),
        }
    }

    unsafe fn object_free(&mut self, object: RawPtr) {
        self.free(object, FreeClass::Object);
    }

    unsafe fn reference_free(&mut self, reference: RawPtr) {
        self.free(reference, FreeClass::Reference);
    }

    unsafe fn repository_free(&mut self, repository: RawPtr) {
        self.free(repository, FreeClass::Repository);
    }

    fn last_error(&self) -> Option<VclError> {
        self.last_error.clone()
    }
}
