use std::fmt;

/// Possible errors returned by methods on a RIB. All of these errors are
/// recoverable, unrecoverable conditions are signalled with the stand-alone
/// [FatalError] type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RibError {
    /// The prefix belongs to an address family the RIB was not configured
    /// for. The path has not been stored.
    AddressFamilyMismatch,
    /// The requested prefix was not found in the RIB.
    PrefixNotFound,
    /// The path that was requested to be replaced or removed is not stored
    /// for the prefix.
    PathNotFound,
    /// A VRF with this name is already present in the registry.
    VrfExists(String),
    /// A RIB with this name is already present in the VRF.
    RibExists(String),
    /// The string could not be parsed as a route distinguisher in the
    /// `ASN:ID` format.
    InvalidRouteDistinguisher(String),
    /// A downstream client refused an update. The upstream RIB logs this
    /// error, it never unwinds its own state because of it.
    ClientRejected(String),
    /// An outgoing RIB has handed out every ADD-PATH path identifier it
    /// has.
    OutOfPathIds,
}

impl std::error::Error for RibError {}

impl fmt::Display for RibError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RibError::AddressFamilyMismatch => write!(
                f,
                "Error: The address family of the prefix does not match \
                the address family of the RIB."
            ),
            RibError::PrefixNotFound => {
                write!(f, "Error: The Prefix cannot be found.")
            }
            RibError::PathNotFound => {
                write!(f, "Error: The Path cannot be found for this Prefix.")
            }
            RibError::VrfExists(name) => write!(
                f,
                "Error: A VRF with the name '{}' already exists.",
                name
            ),
            RibError::RibExists(name) => write!(
                f,
                "Error: A table with the name '{}' already exists.",
                name
            ),
            RibError::InvalidRouteDistinguisher(reason) => {
                write!(f, "Error: Invalid route distinguisher: {}", reason)
            }
            RibError::ClientRejected(reason) => {
                write!(f, "Error: The client rejected the update: {}", reason)
            }
            RibError::OutOfPathIds => {
                write!(f, "Error: No more path identifiers available.")
            }
        }
    }
}

/// An unrecoverable error. It signals the violation of an internal counting
/// invariant, e.g. a reference counter that overflows. The state of the RIB
/// should be considered corrupt and the application receiving this error
/// should probably terminate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FatalError;

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: A Fatal error has occurred. The RIB must be considered \
             corrupted. The application should terminate."
        )
    }
}

pub type FatalResult<T> = Result<T, FatalError>;

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
