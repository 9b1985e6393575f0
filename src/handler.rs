//! Object macro dispatch.
//!
//! RiveScript source can declare `> object NAME LANG` blocks whose bodies are
//! code in some host language. The core doesn't interpret those bodies; it
//! hands them to whatever [`ObjectHandler`] is registered for `LANG` and later
//! dispatches `<call>` tags back to it.

/// A language handler for RiveScript object macros.
pub trait ObjectHandler: Send + Sync {
    /// Load an object's source code. Called once per object block at
    /// parse-merge time. Return `false` to decline the object; it will not be
    /// indexed for `<call>`.
    fn load(&mut self, name: &str, code: &[String]) -> bool;

    /// Invoke a previously loaded object. `user` is the id of the user whose
    /// `reply()` call triggered the invocation. Errors should be reported as
    /// text beginning with `[ERR:`.
    fn call(&self, name: &str, args: &[String], user: &str) -> String;
}

/// A native Rust object macro, registered via
/// [`set_subroutine`](crate::RiveScript::set_subroutine).
///
/// Receives the current user id and the whitespace-split `<call>` arguments.
pub type Subroutine = Box<dyn Fn(&str, &[String]) -> String + Send + Sync>;
