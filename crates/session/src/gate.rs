//! Gated activation of the generated cart.
//!
//! The run surface initialises itself on every reload. Whether it then runs
//! the cart left in the working directory is decided here, from the persisted
//! arm flag. The flag is forced off when the gate is built so a cart from a
//! previous session never starts on its own.

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use state::{ArmState, ArmStore};

const CART_DIR: &str = "Local Storage";
const CART_FILE: &str = "cart.js";

/// Where the backend writes the generated cart.
pub fn cart_path(working_directory: impl AsRef<Path>) -> PathBuf {
    working_directory.as_ref().join(CART_DIR).join(CART_FILE)
}

/// The run surface's ability to execute a module.
pub trait ModuleHost {
    /// Load the module at `path` and run its entry point.
    fn execute_module(&mut self, path: &Path) -> eyre::Result<()>;

    /// Attach an entry point that does nothing.
    fn attach_noop(&mut self);
}

/// What [`SandboxGate::activate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Executed(PathBuf),
    Idle,
}

pub struct SandboxGate<A> {
    store: A,
    cart_path: PathBuf,
}

impl<A> SandboxGate<A>
where
    A: ArmStore,
{
    /// Take ownership of the arm flag, resetting it to disarmed.
    pub fn new(store: A, working_directory: impl AsRef<Path>) -> eyre::Result<Self> {
        let previous = store.read_arm();
        store
            .write_arm(ArmState::Disarmed)
            .wrap_err("disarming sandbox")?;
        tracing::debug!(?previous, "sandbox disarmed");

        Ok(Self {
            store,
            cart_path: cart_path(working_directory),
        })
    }

    pub fn state(&self) -> ArmState {
        self.store.read_arm()
    }

    pub fn cart_path(&self) -> &Path {
        &self.cart_path
    }

    /// Allow the next surface initialisation to run the cart.
    ///
    /// The flag is persisted when this returns.
    pub(crate) fn arm(&self) -> eyre::Result<()> {
        self.store
            .write_arm(ArmState::Armed)
            .wrap_err("arming sandbox")?;
        tracing::debug!("sandbox armed");
        Ok(())
    }

    /// Called when the run surface initialises. Leaves the arm flag as it is.
    #[tracing::instrument(skip_all)]
    pub fn activate(&self, host: &mut impl ModuleHost) -> eyre::Result<Activation> {
        match self.store.read_arm() {
            ArmState::Armed => {
                tracing::debug!(cart = %self.cart_path.display(), "executing cart");
                host.execute_module(&self.cart_path)
                    .wrap_err_with(|| format!("executing {}", self.cart_path.display()))?;
                Ok(Activation::Executed(self.cart_path.clone()))
            }
            ArmState::Disarmed => {
                tracing::debug!("sandbox disarmed, not executing cart");
                host.attach_noop();
                Ok(Activation::Idle)
            }
        }
    }
}
