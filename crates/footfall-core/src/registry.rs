//! Discriminator registry — maps an interaction subtype to the tag stored on
//! its documents and the payload fields it owns.

use std::collections::HashMap;

use crate::{
  Error, Result,
  interaction::{InteractionRecord, Visit},
  query::Projection,
};

/// How one subtype is recognised in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
  /// Value of the document's discriminator field.
  pub value:  String,
  /// Payload fields belonging to the subtype.
  pub fields: Vec<String>,
}

impl Discriminator {
  pub fn new(value: impl Into<String>, fields: &[&str]) -> Self {
    Self {
      value:  value.into(),
      fields: fields.iter().map(|f| (*f).to_owned()).collect(),
    }
  }

  /// A projection returning exactly this subtype's fields.
  pub fn projection(&self) -> Projection { Projection::Fields(self.fields.clone()) }
}

/// Subtype tag → [`Discriminator`], consulted on every narrowed load.
#[derive(Debug, Clone)]
pub struct DiscriminatorRegistry {
  entries: HashMap<&'static str, Discriminator>,
}

impl DiscriminatorRegistry {
  /// A registry that knows no subtypes at all.
  pub fn empty() -> Self { Self { entries: HashMap::new() } }

  /// Register `tag`, returning the entry it replaced.
  pub fn register(
    &mut self,
    tag: &'static str,
    discriminator: Discriminator,
  ) -> Option<Discriminator> {
    self.entries.insert(tag, discriminator)
  }

  pub fn lookup(&self, tag: &'static str) -> Result<&Discriminator> {
    self.entries.get(tag).ok_or(Error::UnregisteredType(tag))
  }

  /// The discriminator narrowing loads of `T`, or `None` when `T` is the
  /// root interaction type.
  pub fn resolve<T: InteractionRecord>(&self) -> Result<Option<&Discriminator>> {
    T::TYPE_TAG.map(|tag| self.lookup(tag)).transpose()
  }
}

impl Default for DiscriminatorRegistry {
  /// The built-in subtypes.
  fn default() -> Self {
    let mut registry = Self::empty();
    registry.register(Visit::TAG, Discriminator::new(Visit::DISCRIMINATOR, Visit::FIELDS));
    registry
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::interaction::Interaction;

  #[test]
  fn root_type_is_never_narrowed() {
    let registry = DiscriminatorRegistry::empty();
    assert!(registry.resolve::<Interaction>().unwrap().is_none());
  }

  #[test]
  fn visit_is_registered_by_default() {
    let registry = DiscriminatorRegistry::default();
    let d = registry.resolve::<Visit>().unwrap().unwrap();
    assert_eq!(d.value, "Visit");
    assert!(d.fields.iter().any(|f| f == "traffic_type"));
  }

  #[test]
  fn unregistered_subtype_is_a_configuration_error() {
    let registry = DiscriminatorRegistry::empty();
    let err = registry.resolve::<Visit>().unwrap_err();
    assert!(matches!(err, Error::UnregisteredType("visit")));
    assert!(err.is_configuration());
  }
}
