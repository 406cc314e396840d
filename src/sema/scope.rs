use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};

use crate::{
    errors::{SmithError, SmithResult},
    sema::FunctionTable,
    typing::ty::Ty,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Moved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: Ty,
    pub mutable: bool,
    pub state: Ownership,
    pins: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Frame {
    bindings: BTreeMap<String, Binding>,
    loop_boundary: bool,
}

/// Lexical scope chain of the function being generated, innermost frame
/// last. A `Scope` is a plain value: `child` hands out a new chain and the
/// receiver keeps seeing only its own frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl Scope {
    pub fn new() -> Scope {
        Scope {
            frames: vec![Frame::default()],
        }
    }

    pub fn child(&self) -> Scope {
        let mut frames = self.frames.clone();
        frames.push(Frame::default());
        Scope { frames }
    }

    /// Child scope for a loop body. Bindings declared outside of it can be
    /// read but never moved from inside, since the body runs repeatedly.
    pub fn loop_child(&self) -> Scope {
        let mut frames = self.frames.clone();
        frames.push(Frame {
            bindings: BTreeMap::new(),
            loop_boundary: true,
        });
        Scope { frames }
    }

    /// Drops the innermost frame. Ownership changes made to outer bindings
    /// while the frame was open are kept.
    pub fn into_parent(mut self) -> Scope {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        self
    }

    pub fn in_loop(&self) -> bool {
        self.frames.iter().any(|f| f.loop_boundary)
    }

    /// Adds a binding to the innermost frame. Returns `false`, leaving the
    /// table untouched, if the frame already declares `name`.
    pub fn declare(&mut self, name: &str, ty: Ty, mutable: bool) -> bool {
        match self.frames.last_mut() {
            Some(frame) => Scope::insert(frame, name, ty, mutable),
            None => false,
        }
    }

    /// Adds a binding to the outermost frame of the function.
    pub fn declare_in_root(&mut self, name: &str, ty: Ty, mutable: bool) -> bool {
        match self.frames.first_mut() {
            Some(frame) => Scope::insert(frame, name, ty, mutable),
            None => false,
        }
    }

    fn insert(frame: &mut Frame, name: &str, ty: Ty, mutable: bool) -> bool {
        if frame.bindings.contains_key(name) {
            return false;
        }

        frame.bindings.insert(
            name.to_string(),
            Binding {
                ty,
                mutable,
                state: Ownership::Owned,
                pins: 0,
            },
        );
        true
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    fn binding_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.bindings.get_mut(name))
    }

    /// Type of `name`, searching frames innermost first and then the
    /// function signatures.
    pub fn lookup(&self, name: &str, functions: &FunctionTable) -> Option<Ty> {
        self.binding(name)
            .map(|b| b.ty.clone())
            .or_else(|| functions.get(name).map(|sig| sig.ty()))
    }

    pub fn is_owned(&self, name: &str) -> bool {
        matches!(self.binding(name), Some(b) if b.state == Ownership::Owned)
    }

    pub fn mark_moved(&mut self, name: &str) -> SmithResult<()> {
        let binding = self
            .binding_mut(name)
            .ok_or_else(|| SmithError::lookup_miss(name))?;
        binding.state = Ownership::Moved;
        Ok(())
    }

    /// Keeps `name` from being moved until a matching `unpin`. Pins nest.
    pub fn pin(&mut self, name: &str) {
        if let Some(binding) = self.binding_mut(name) {
            binding.pins += 1;
        }
    }

    pub fn unpin(&mut self, name: &str) {
        if let Some(binding) = self.binding_mut(name) {
            binding.pins = binding.pins.saturating_sub(1);
        }
    }

    /// The innermost binding of every visible name with the index of the
    /// frame that declares it, ordered by name.
    fn visible(&self) -> BTreeMap<&str, (usize, &Binding)> {
        let mut visible = BTreeMap::new();
        for (idx, frame) in self.frames.iter().enumerate().rev() {
            for (name, binding) in frame.bindings.iter() {
                visible.entry(name.as_str()).or_insert((idx, binding));
            }
        }
        visible
    }

    fn loop_floor(&self) -> usize {
        self.frames
            .iter()
            .rposition(|f| f.loop_boundary)
            .unwrap_or(0)
    }

    pub fn any_variable_where<P>(&self, pred: P) -> bool
    where
        P: Fn(&str, &Binding) -> bool,
    {
        self.visible()
            .into_iter()
            .any(|(name, (_, b))| b.state == Ownership::Owned && pred(name, b))
    }

    /// Uniform choice among the visible owned variables accepted by `pred`.
    pub fn random_variable_where<R, P>(&self, rng: &mut R, pred: P) -> Option<(String, Ty)>
    where
        R: Rng + ?Sized,
        P: Fn(&str, &Binding) -> bool,
    {
        let candidates = self
            .visible()
            .into_iter()
            .filter(|(name, (_, b))| b.state == Ownership::Owned && pred(name, b))
            .map(|(name, (_, b))| (name.to_string(), b.ty.clone()))
            .collect::<Vec<_>>();
        candidates.choose(rng).cloned()
    }

    /// Uniform choice among the visible owned variables whose type resolves
    /// to `ty`.
    pub fn random_variable_of_type<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ty: &Ty,
    ) -> Option<(String, Ty)> {
        self.random_variable_where(rng, |_, b| b.ty.same_as(ty))
    }

    /// Like `random_variable_of_type`, restricted to variables that may be
    /// consumed here: declared inside the innermost loop body (if any) and
    /// not pinned.
    pub fn movable_variable_of_type<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ty: &Ty,
    ) -> Option<(String, Ty)> {
        let floor = self.loop_floor();
        let candidates = self
            .visible()
            .into_iter()
            .filter(|(_, (idx, b))| {
                *idx >= floor && b.state == Ownership::Owned && b.pins == 0 && b.ty.same_as(ty)
            })
            .map(|(name, (_, b))| (name.to_string(), b.ty.clone()))
            .collect::<Vec<_>>();
        candidates.choose(rng).cloned()
    }

    /// Every visible, still owned variable, sorted by name.
    pub fn current_variables(&self) -> Vec<String> {
        self.visible()
            .into_iter()
            .filter(|(_, (_, b))| b.state == Ownership::Owned)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
