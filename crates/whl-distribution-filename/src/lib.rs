pub use identity::{PackageIdentity, PackageIdentityError};

mod identity;
