use crate::domain::DrivenPortError;
use anyhow::anyhow;

/// Connectivity represents the reachability of a faked API port and provides common behavior
/// for failing the way the real API adapter would when the port is configured to be unreachable
/// or to reject the session.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Connectivity {
    Connected,
    Disconnected,
    Rejected,
}

impl Connectivity {
    /// Return an error if connectivity is not in a "connected" state
    pub fn blow_up_if_unreachable(&self) -> Result<(), DrivenPortError> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(DrivenPortError::CommsFailure(anyhow!(
                "could not connect to the task API!"
            ))),
            Self::Rejected => Err(DrivenPortError::Unauthorized),
        }
    }
}

/// FakeImplementation is a quick drop-in property that helps mock a function and capture
/// arguments the function is called with. It's useful for faking async ports, since
/// popular rust mocking tools don't work well with async functions on traits.
///
/// * [Args] represents the arguments passed to the function that should be captured on a call
/// * [Ret] represents the type of the function's return value
///
/// # Example
///
/// ```ignore
/// struct FakePrompt {
///   confirm_result: FakeImplementation<String, bool>,
/// }
///
/// impl AckPrompt for Mutex<FakePrompt> {
///   async fn confirm(&self, message: &str) -> bool {
///     let mut locked_self = self.lock().unwrap();
///     locked_self.confirm_result.save_arguments(message.to_owned());
///     locked_self.confirm_result.return_value()
///   }
/// }
/// ```
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    /// Creates a new FakeImplementation
    pub fn new() -> FakeImplementation<Args, Ret> {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }

    /// Saves arguments from a single invocation of the FakeImplementation
    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments)
    }

    /// Returns the list of arguments passed on every call to this FakeImplementation
    pub fn calls(&self) -> &[Args] {
        self.saved_arguments.as_slice()
    }
}

impl<Args, Ret> FakeImplementation<Args, Ret>
where
    Ret: Clone,
{
    /// Set the value that should be returned when this FakeImplementation is invoked
    pub fn set_return_value(&mut self, return_value: Ret) {
        self.return_value = Some(return_value)
    }

    /// Retrieve the configured return value for this FakeImplementation
    pub fn return_value(&self) -> Ret {
        match self.return_value {
            None => panic!("Tried to return from a function where the return value wasn't set!"),
            Some(ref ret_val) => ret_val.clone(),
        }
    }
}
