mod document;
mod grant;
mod requester;
mod user;

pub use document::{Document, DocumentUid, RestrictionState, UNRESTRICTED_SENTINEL};
pub use grant::AccessGrantEntry;
pub use requester::{AuthenticatedUser, Requester};
pub use user::{split_id_list, UserProfile, UserUid};
