//! Function definitions and the arity trampolines behind them.
//!
//! The host calls every module function with an argument count and an
//! argument vector. A [`Defun`] accepts any count in `min_args..=max_args`
//! and passes the host's nil for optional arguments that were not supplied,
//! so binding functions always see a fixed arity.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use tether_host::Host;

use crate::error::{ModuleError, ModuleResult};

pub type Fn1<H> = fn(&mut H, <H as Host>::Value) -> <H as Host>::Value;
pub type Fn2<H> = fn(&mut H, <H as Host>::Value, <H as Host>::Value) -> <H as Host>::Value;

/// A binding function of fixed arity.
pub enum Callable<H: Host> {
    Arity1(Fn1<H>),
    Arity2(Fn2<H>),
}

impl<H: Host> Callable<H> {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Arity1(_) => 1,
            Callable::Arity2(_) => 2,
        }
    }
}

/// A named module function.
pub struct Defun<H: Host> {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub doc: &'static str,
    pub func: Callable<H>,
}

impl<H: Host> Defun<H> {
    /// A function taking `min_args` up to the callable's arity.
    pub fn new(name: &'static str, min_args: usize, doc: &'static str, func: Callable<H>) -> Self {
        Self {
            name,
            min_args,
            max_args: func.arity(),
            doc,
            func,
        }
    }

    pub fn validate(&self) -> ModuleResult<()> {
        if self.min_args > self.max_args || self.max_args != self.func.arity() {
            return Err(ModuleError::InvalidArity {
                name: self.name.to_string(),
                min: self.min_args,
                max: self.max_args,
                takes: self.func.arity(),
            });
        }
        Ok(())
    }

    /// Call the function with `args`, padding missing optional arguments
    /// with nil.
    pub fn call(&self, host: &mut H, args: Vec<H::Value>) -> ModuleResult<H::Value> {
        let got = args.len();
        if got < self.min_args || got > self.max_args {
            return Err(ModuleError::WrongArgCount {
                name: self.name.to_string(),
                min: self.min_args,
                max: self.max_args,
                got,
            });
        }
        trace!(name = self.name, got, "dispatching");
        let mut args = args.into_iter();
        let mut next = |host: &mut H| args.next().unwrap_or_else(|| host.nil());
        let result = match &self.func {
            Callable::Arity1(f) => {
                let a = next(host);
                f(host, a)
            }
            Callable::Arity2(f) => {
                let a = next(host);
                let b = next(host);
                f(host, a, b)
            }
        };
        Ok(result)
    }
}

impl<H: Host> fmt::Debug for Defun<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defun")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Every function a module exports, by name.
pub struct FunctionRegistry<H: Host> {
    defuns: BTreeMap<&'static str, Defun<H>>,
}

impl<H: Host> Default for FunctionRegistry<H> {
    fn default() -> Self {
        Self {
            defuns: BTreeMap::new(),
        }
    }
}

impl<H: Host> FunctionRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, defun: Defun<H>) -> ModuleResult<()> {
        defun.validate()?;
        if self.defuns.contains_key(defun.name) {
            return Err(ModuleError::DuplicateFunction(defun.name.to_string()));
        }
        debug!(
            name = defun.name,
            min = defun.min_args,
            max = defun.max_args,
            "registered function"
        );
        self.defuns.insert(defun.name, defun);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Defun<H>> {
        self.defuns.get(name)
    }

    pub fn call(&self, host: &mut H, name: &str, args: Vec<H::Value>) -> ModuleResult<H::Value> {
        self.get(name)
            .ok_or_else(|| ModuleError::UnknownFunction(name.to_string()))?
            .call(host, args)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.defuns.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.defuns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defuns.is_empty()
    }
}

impl<H: Host> fmt::Debug for FunctionRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.defuns.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use tether_host::{HostValue, InMemoryHost};
    use tether_types::HandleKind;

    use super::*;
    use crate::config::ModuleConfig;
    use crate::handles::{kind_of, wrap};
    use crate::lifecycle::{init, teardown};
    use crate::testutil::{serial, SharedVcl};

    fn ident(_host: &mut InMemoryHost, a: HostValue) -> HostValue {
        a
    }

    fn pair(_host: &mut InMemoryHost, a: HostValue, b: HostValue) -> HostValue {
        HostValue::Str(format!("{a:?}|{b:?}"))
    }

    fn repository_p(host: &mut InMemoryHost, value: HostValue) -> HostValue {
        if kind_of(host, &value) == HandleKind::Repository {
            HostValue::Int(1)
        } else {
            host.nil()
        }
    }

    fn registry() -> FunctionRegistry<InMemoryHost> {
        let mut registry: FunctionRegistry<InMemoryHost> = FunctionRegistry::new();
        registry
            .register(Defun::new("git-object-id", 1, "Return the ID of OBJ.", Callable::Arity1(ident)))
            .unwrap();
        registry
            .register(Defun::new(
                "git-repository-init",
                1,
                "Initialize a repository at PATH, optionally bare.",
                Callable::Arity2(pair),
            ))
            .unwrap();
        registry
            .register(Defun::new("git-clone", 2, "Clone URL into PATH.", Callable::Arity2(pair)))
            .unwrap();
        registry
    }

    #[test]
    fn names_are_sorted() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["git-clone", "git-object-id", "git-repository-init"]
        );
        assert_eq!(registry.get("git-repository-init").unwrap().max_args, 2);
    }

    #[test]
    fn missing_optional_argument_is_nil() {
        let registry = registry();
        let mut host = InMemoryHost::new();
        let out = registry
            .call(&mut host, "git-repository-init", vec![HostValue::Str("/tmp/r".into())])
            .unwrap();
        assert_eq!(out, HostValue::Str("Str(\"/tmp/r\")|Nil".into()));

        let out = registry
            .call(
                &mut host,
                "git-repository-init",
                vec![HostValue::Str("/tmp/r".into()), HostValue::Int(1)],
            )
            .unwrap();
        assert_eq!(out, HostValue::Str("Str(\"/tmp/r\")|Int(1)".into()));
    }

    #[test]
    fn argument_count_is_checked() {
        let registry = registry();
        let mut host = InMemoryHost::new();
        let err = registry
            .call(&mut host, "git-clone", vec![HostValue::Nil])
            .unwrap_err();
        assert_eq!(
            err,
            ModuleError::WrongArgCount {
                name: "git-clone".into(),
                min: 2,
                max: 2,
                got: 1,
            }
        );
        assert!(registry
            .call(&mut host, "git-object-id", vec![HostValue::Nil, HostValue::Nil])
            .is_err());
    }

    #[test]
    fn unknown_and_duplicate_names_are_rejected() {
        let mut registry = registry();
        let mut host = InMemoryHost::new();
        assert_eq!(
            registry.call(&mut host, "git-nope", vec![]).unwrap_err(),
            ModuleError::UnknownFunction("git-nope".into())
        );
        let err = registry
            .register(Defun::new("git-clone", 1, "", Callable::Arity1(ident)))
            .unwrap_err();
        assert_eq!(err, ModuleError::DuplicateFunction("git-clone".into()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn inconsistent_arity_is_rejected() {
        let mut registry = FunctionRegistry::<InMemoryHost>::new();
        let too_many = Defun::new("git-object-p", 2, "", Callable::Arity1(ident));
        assert!(matches!(
            registry.register(too_many),
            Err(ModuleError::InvalidArity { min: 2, max: 1, .. })
        ));
        let mut wide = Defun::new("git-reference-name", 1, "", Callable::Arity1(ident));
        wide.max_args = 3;
        assert!(registry.register(wide).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn predicates_see_module_handles() {
        let _serial = serial();
        let (vcl, inner) = SharedVcl::new();
        let (repo, head) = {
            let mut v = inner.lock().unwrap();
            let repo = v.open_repository();
            (repo, v.lookup_reference(repo))
        };
        init(Box::new(vcl), ModuleConfig::default()).unwrap();

        let mut registry: FunctionRegistry<InMemoryHost> = FunctionRegistry::new();
        registry
            .register(Defun::new(
                "git-repository-p",
                1,
                "Return non-nil if OBJ is a git repository.",
                Callable::Arity1(repository_p),
            ))
            .unwrap();

        let mut host = InMemoryHost::new();
        let h_repo = unsafe { wrap(&mut host, HandleKind::Repository, repo) }.unwrap();
        let h_head = unsafe { wrap(&mut host, HandleKind::Reference, head) }.unwrap();
        let yes = registry
            .call(&mut host, "git-repository-p", vec![h_repo.clone()])
            .unwrap();
        let no = registry
            .call(&mut host, "git-repository-p", vec![h_head.clone()])
            .unwrap();
        assert_eq!(yes, HostValue::Int(1));
        assert_eq!(no, HostValue::Nil);

        host.collect(&h_head);
        host.collect(&h_repo);
        assert_eq!(inner.lock().unwrap().live_count(), 0);
        assert!(teardown().unwrap().is_clean());
    }
}
