use std::any::Any;

/// A pool of type-erased objects.
///
/// The pool is intended to hold intermediate data used as scratch space in computations.
/// It is optimized for the case where the same type is taken and returned many times in a row.
#[derive(Debug, Default)]
pub struct Workspace {
    objects: Vec<Box<dyn Any + Send>>,
}

impl Workspace {
    /// Removes an object of type `W` from the pool, if there is one.
    pub fn take<W>(&mut self) -> Option<W>
    where
        W: 'static + Send,
    {
        // The Vec is treated as a stack, and the most recently returned object is the most
        // likely one to be requested next
        let idx = self.objects.iter().rposition(|obj| obj.is::<W>())?;
        let object = self.objects.swap_remove(idx);
        let object = object
            .downcast()
            .expect("Internal error: Downcasting can by definition not fail");
        Some(*object)
    }

    /// Returns an object to the pool.
    pub fn insert<W>(&mut self, object: W)
    where
        W: 'static + Send,
    {
        self.objects.push(Box::new(object));
    }
}
