// Entity Models
//
// Clinic records and the registry that holds the working list.

pub mod clinic;
pub mod registry;

pub use clinic::{default_clinics, Clinic};
pub use registry::{load_bulk, ClinicRegistry, UploadMode};
