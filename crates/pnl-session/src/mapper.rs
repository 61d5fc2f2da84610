#![forbid(unsafe_code)]

//! Conversion between domain models and their API (persistence) shapes.

/// Two-way mapping between a domain model and its wire shape.
///
/// Implement one mapper per entity so field renames live in one place.
pub trait Mapper<Domain, Persistence> {
    /// Wire shape to domain model.
    fn to_domain(&self, raw: Persistence) -> Domain;

    /// Domain model to wire shape.
    fn to_persistence(&self, domain: Domain) -> Persistence;

    /// Map a batch of wire records.
    fn to_domain_all(&self, raws: impl IntoIterator<Item = Persistence>) -> Vec<Domain>
    where
        Self: Sized,
    {
        raws.into_iter().map(|raw| self.to_domain(raw)).collect()
    }
}
