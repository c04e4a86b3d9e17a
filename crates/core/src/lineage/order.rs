#![forbid(unsafe_code)]

/// Total execution order for edge writes: closer-to-root edges settle first.
///
/// Field order is the comparison order: ancestor depth, ancestor id, distance, descendant id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriteOrderKey {
    pub ancestor_depth: u32,
    pub ancestor_id: String,
    pub distance: u32,
    pub descendant_id: String,
}
