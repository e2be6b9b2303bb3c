//! Scoped environment.
//!
//! The [`Store`] is an arena of scope frames plus the entity property bags.
//! An [`Environment`] is a cursor pointing at one frame; lookups walk the
//! parent indices from that frame towards the root.
//!
//! Frames created through [`Environment::new_child`] or
//! [`Environment::object_scope`] live exactly as long as the returned
//! `Environment`, which matches the strictly nested, single-threaded way
//! commands are executed. The root frame and the entity bags persist for the
//! whole session.
//!
//! ```text
//! root ── entities ── captures ── {this} ── object(apple)
//!  ^ frame 0                                  ^ reads/writes apple's bag
//! ```

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::error::{Error, ErrorKind, Result, SemanticLimit};
use crate::value::{ObjId, Value};

/// Named values held by a frame or an entity.
pub type Bindings = im::OrdMap<String, Value>;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Index of a frame in the [`Store`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The root frame.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Returns the frame index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
enum Storage {
    /// Bindings owned by the frame itself.
    Local(Bindings),
    /// The frame reads and writes an entity's property bag.
    Object(ObjId),
}

#[derive(Clone, Debug)]
struct Frame {
    storage: Storage,
    parent: Option<ScopeId>,
}

/// Arena of scope frames and entity property bags.
#[derive(Debug)]
pub struct Store {
    frames: Vec<Frame>,
    objects: BTreeMap<ObjId, Bindings>,
    output: Vec<Vec<String>>,
    rng: ChaCha8Rng,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Store {
    /// Creates a store with an empty root scope and a seeded RNG.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            frames: vec![Frame {
                storage: Storage::Local(Bindings::new()),
                parent: None,
            }],
            objects: BTreeMap::new(),
            output: vec![Vec::new()],
            rng: ChaCha8Rng::seed_from_u64(seed),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Sets the maximum depth of nested function calls.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Returns an environment positioned at the root scope.
    pub fn root(&mut self) -> Environment<'_> {
        Environment {
            store: self,
            scope: ScopeId::ROOT,
            owned: false,
        }
    }

    /// Registers (or replaces) an entity property bag.
    pub fn insert_object(&mut self, id: impl Into<ObjId>, properties: Bindings) {
        self.objects.insert(id.into(), properties);
    }

    /// Returns an entity property bag.
    #[must_use]
    pub fn object(&self, id: &ObjId) -> Option<&Bindings> {
        self.objects.get(id)
    }

    /// Returns a single entity property.
    #[must_use]
    pub fn property(&self, id: &ObjId, key: &str) -> Option<&Value> {
        self.objects.get(id).and_then(|bag| bag.get(key))
    }

    /// Returns true if an entity with this id exists.
    #[must_use]
    pub fn has_object(&self, id: &ObjId) -> bool {
        self.objects.contains_key(id)
    }

    /// Iterates over all entity ids in order.
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjId> {
        self.objects.keys()
    }

    /// Number of live frames (root included).
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Starts capturing output in a fresh buffer.
    pub fn push_output_buffer(&mut self) {
        self.output.push(Vec::new());
    }

    /// Stops capturing and returns the innermost buffer.
    ///
    /// The base buffer is never removed; popping it just drains it.
    pub fn pop_output_buffer(&mut self) -> Vec<String> {
        if self.output.len() > 1 {
            self.output.pop().unwrap_or_default()
        } else {
            self.take_output()
        }
    }

    /// Appends lines to the innermost buffer.
    pub fn extend_output(&mut self, lines: impl IntoIterator<Item = String>) {
        if let Some(buffer) = self.output.last_mut() {
            buffer.extend(lines);
        }
    }

    /// Drains the innermost output buffer.
    pub fn take_output(&mut self) -> Vec<String> {
        self.output.last_mut().map(std::mem::take).unwrap_or_default()
    }

    fn push_frame(&mut self, storage: Storage, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame {
            storage,
            parent: Some(parent),
        });
        id
    }

    fn read<'a>(&'a self, frame: &'a Frame, name: &str) -> Option<&'a Value> {
        match &frame.storage {
            Storage::Local(bindings) => bindings.get(name),
            Storage::Object(id) => self.property(id, name),
        }
    }

    fn frame_defines(&self, frame: &Frame, name: &str) -> bool {
        self.read(frame, name).is_some()
    }

    fn write(&mut self, scope: ScopeId, name: &str, value: Value) {
        let Some(frame) = self.frames.get_mut(scope.0) else {
            return;
        };
        match &mut frame.storage {
            Storage::Local(bindings) => {
                bindings.insert(name.to_string(), value);
            }
            Storage::Object(id) => {
                let id = id.clone();
                self.objects
                    .entry(id)
                    .or_default()
                    .insert(name.to_string(), value);
            }
        }
    }

    /// Reads `key` from a container value.
    ///
    /// Maps and entities are indexed by key; lists by integer index; lists and
    /// strings also expose `length`. Anything else is a miss.
    #[must_use]
    pub fn member(&self, target: &Value, key: &str) -> Option<Value> {
        match target {
            Value::Map(map) => map.get(key).cloned(),
            Value::Obj(id) => self.property(id, key).cloned(),
            Value::List(items) => {
                if key == "length" {
                    return Some(Value::from(items.len()));
                }
                key.parse::<usize>().ok().and_then(|i| items.get(i).cloned())
            }
            Value::String(s) if key == "length" => Some(Value::from(s.chars().count())),
            _ => None,
        }
    }

    /// Writes `value` at `keys` below `target`, returning the updated target.
    ///
    /// Entity references are updated in place and returned unchanged; maps and
    /// lists are rebuilt persistently. Nil is treated as an empty map so that
    /// intermediate containers are created on demand.
    ///
    /// # Errors
    /// Returns a type mismatch if a non-container value is in the path.
    pub fn assign(&mut self, target: Value, keys: &[String], value: Value) -> Result<Value> {
        let Some((key, rest)) = keys.split_first() else {
            return Ok(value);
        };
        match target {
            Value::Obj(id) => {
                let current = self.property(&id, key).cloned().unwrap_or_default();
                let updated = self.assign(current, rest, value)?;
                self.objects
                    .entry(id.clone())
                    .or_default()
                    .insert(key.clone(), updated);
                Ok(Value::Obj(id))
            }
            Value::Map(mut map) => {
                let current = map.get(key).cloned().unwrap_or_default();
                let updated = self.assign(current, rest, value)?;
                map.insert(key.clone(), updated);
                Ok(Value::Map(map))
            }
            Value::Nil => {
                let updated = self.assign(Value::Nil, rest, value)?;
                Ok(Value::Map(Bindings::unit(key.clone(), updated)))
            }
            Value::List(mut items) => {
                let index = key
                    .parse::<usize>()
                    .map_err(|_| Error::type_mismatch("list index", "string"))?;
                let current = items.get(index).cloned().unwrap_or_default();
                let updated = self.assign(current, rest, value)?;
                if index < items.len() {
                    items.set(index, updated);
                } else {
                    items.push_back(updated);
                }
                Ok(Value::List(items))
            }
            other => Err(Error::type_mismatch("map or object", other.type_name())),
        }
    }
}

// =============================================================================
// Environment
// =============================================================================

/// A cursor over the [`Store`] positioned at one scope frame.
///
/// Dropping an environment created by [`new_child`](Self::new_child) or
/// [`object_scope`](Self::object_scope) releases its frame.
#[derive(Debug)]
pub struct Environment<'s> {
    store: &'s mut Store,
    scope: ScopeId,
    owned: bool,
}

impl Drop for Environment<'_> {
    fn drop(&mut self) {
        if self.owned {
            self.store.frames.truncate(self.scope.0);
        }
    }
}

impl<'s> Environment<'s> {
    /// Returns the frame this environment points at.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        self.store
    }

    /// Write access to the underlying store.
    pub fn store_mut(&mut self) -> &mut Store {
        self.store
    }

    /// Creates a child scope holding `bindings`.
    pub fn new_child(&mut self, bindings: Bindings) -> Environment<'_> {
        let scope = self.store.push_frame(Storage::Local(bindings), self.scope);
        Environment {
            store: &mut *self.store,
            scope,
            owned: true,
        }
    }

    /// Creates a child scope whose bindings are an entity's property bag.
    ///
    /// Reads fall through to the parent chain; `def` and `set` on names the
    /// entity owns write straight into the bag.
    pub fn object_scope(&mut self, obj: &ObjId) -> Environment<'_> {
        let scope = self
            .store
            .push_frame(Storage::Object(obj.clone()), self.scope);
        Environment {
            store: &mut *self.store,
            scope,
            owned: true,
        }
    }

    /// Iterates frames from this scope up to the root.
    fn chain(&self) -> impl Iterator<Item = (ScopeId, &Frame)> {
        let frames = &self.store.frames;
        std::iter::successors(Some(self.scope), move |id| {
            frames.get(id.0).and_then(|f| f.parent)
        })
        .filter_map(move |id| frames.get(id.0).map(|f| (id, f)))
    }

    fn owner_of(&self, name: &str) -> Option<ScopeId> {
        self.chain()
            .find(|(_, frame)| self.store.frame_defines(frame, name))
            .map(|(id, _)| id)
    }

    /// Looks a single name up the scope chain.
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<Value> {
        self.chain()
            .find_map(|(_, frame)| self.store.read(frame, name))
            .cloned()
    }

    /// Returns true if any enclosing scope defines `name`.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.owner_of(name).is_some()
    }

    /// Resolves a dotted path.
    ///
    /// # Errors
    /// Returns `UndefinedSymbol` if the first segment is not defined anywhere.
    /// Misses further along the path yield nil.
    pub fn get(&self, path: &str) -> Result<Value> {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let mut value = self
            .lookup_name(head)
            .ok_or_else(|| Error::undefined_symbol(head))?;
        for segment in segments {
            match self.store.member(&value, segment) {
                Some(next) => value = next,
                None => return Ok(Value::Nil),
            }
        }
        Ok(value)
    }

    /// Resolves a dotted path, returning `None` on any miss.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let mut value = self.lookup_name(segments.next()?)?;
        for segment in segments {
            value = self.store.member(&value, segment)?;
        }
        Some(value)
    }

    /// Reads `key` from a container value (see [`Store::member`]).
    #[must_use]
    pub fn member(&self, target: &Value, key: &str) -> Option<Value> {
        self.store.member(target, key)
    }

    /// Assigns a dotted path.
    ///
    /// The first segment is written in the nearest scope that already defines
    /// it; if none does, it is bound in the root scope.
    ///
    /// # Errors
    /// Returns a type mismatch if the path runs through a non-container.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let mut segments = path.split('.').map(str::to_string);
        let head = segments.next().unwrap_or_default();
        let keys: Vec<String> = segments.collect();
        self.set_keys(&head, &keys, value.into())
    }

    /// Assigns `name` followed by already-split member keys.
    ///
    /// # Errors
    /// Returns a type mismatch if the path runs through a non-container.
    pub fn set_keys(&mut self, name: &str, keys: &[String], value: Value) -> Result<()> {
        let owner = self.owner_of(name).unwrap_or_else(|| {
            trace!(name, "binding undeclared name in root scope");
            ScopeId::ROOT
        });
        let updated = if keys.is_empty() {
            value
        } else {
            let current = self
                .store
                .frames
                .get(owner.0)
                .and_then(|frame| self.store.read(frame, name))
                .cloned()
                .unwrap_or_default();
            self.store.assign(current, keys, value)?
        };
        self.store.write(owner, name, updated);
        Ok(())
    }

    /// Defines `name` in this scope, shadowing any outer binding.
    pub fn def(&mut self, name: &str, value: impl Into<Value>) {
        self.store.write(self.scope, name, value.into());
    }

    /// Calls the function bound to `fn_name`.
    ///
    /// # Errors
    /// Returns `UndefinedFunction` if nothing is bound, `NotCallable` if the
    /// binding is not a function, or whatever the function itself returns.
    pub fn execute(&mut self, fn_name: &str, args: Vec<Value>) -> Result<Value> {
        match self.lookup(fn_name) {
            Some(Value::Fn(function)) => function.call(self, args),
            Some(other) => Err(Error::new(ErrorKind::NotCallable(format!(
                "{fn_name} is a {}",
                other.type_name()
            )))),
            None => Err(Error::undefined_function(fn_name)),
        }
    }

    /// Returns the ids of entities whose property bag satisfies `predicate`.
    pub fn find_objs(&self, predicate: impl Fn(&ObjId, &Bindings) -> bool) -> Vec<ObjId> {
        self.store
            .objects
            .iter()
            .filter(|&(id, bag)| predicate(id, bag))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Binds each name to a reference to the entity of the same id.
    pub fn create_namespace_references<I>(&mut self, names: I)
    where
        I: IntoIterator,
        I::Item: Into<ObjId>,
    {
        for name in names {
            let id: ObjId = name.into();
            let key = id.as_str().to_string();
            self.store.write(self.scope, &key, Value::Obj(id));
        }
    }

    /// Writes a line to the current output buffer.
    pub fn write(&mut self, text: impl Into<String>) {
        self.store.extend_output([text.into()]);
    }

    /// Returns a uniformly distributed index in `0..len` (0 when empty).
    pub fn random_index(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.store.rng.gen_range(0..len)
        }
    }

    /// Returns a uniformly distributed float in `[0, 1)`.
    pub fn random_unit(&mut self) -> f64 {
        self.store.rng.r#gen::<f64>()
    }

    /// Records entry into a function call.
    ///
    /// # Errors
    /// Returns `LimitExceeded` when the call depth limit is reached.
    pub fn enter_call(&mut self) -> Result<()> {
        if self.store.call_depth >= self.store.max_call_depth {
            return Err(Error::limit_exceeded(SemanticLimit::MaxCallDepth {
                limit: self.store.max_call_depth,
            }));
        }
        self.store.call_depth += 1;
        Ok(())
    }

    /// Records exit from a function call.
    pub fn exit_call(&mut self) {
        self.store.call_depth = self.store.call_depth.saturating_sub(1);
    }
}
