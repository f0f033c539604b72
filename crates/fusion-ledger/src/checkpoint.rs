//! All-or-nothing state transitions.
//!
//! A [`Checkpoint`] captures a full copy of some state before a transaction
//! runs. If the transaction fails at any depth, restoring the checkpoint
//! undoes every token movement, credit change and fill record it made.

/// A saved copy of `S`.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    saved: S,
}

impl<S: Clone> Checkpoint<S> {
    #[must_use]
    pub fn take(state: &S) -> Self {
        Self {
            saved: state.clone(),
        }
    }

    /// Put the saved copy back, discarding everything done since.
    pub fn restore(self, state: &mut S) {
        *state = self.saved;
    }
}

/// Run `f` against `state`, rolling back to the prior state if it fails.
pub fn atomically<S, T, E, F>(state: &mut S, f: F) -> Result<T, E>
where
    S: Clone,
    F: FnOnce(&mut S) -> Result<T, E>,
{
    let checkpoint = Checkpoint::take(state);
    match f(state) {
        Ok(value) => Ok(value),
        Err(err) => {
            checkpoint.restore(state);
            Err(err)
        }
    }
}
