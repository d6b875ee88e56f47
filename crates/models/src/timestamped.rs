/// A document whose modification time is stamped by the store on load.
///
/// The stored value is informational only: every load overwrites it with the
/// backend's modification time for the blob the document came from.
pub trait Timestamped {
    fn id(&self) -> Option<&str>;
    fn last_modified(&self) -> Option<i64>;
    fn set_last_modified(&mut self, millis: i64);
    fn last_modified_by(&self) -> Option<&str>;
}
