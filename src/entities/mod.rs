// Reference records shared by bills
//
// Each entity has:
// - A storage id that is None until the record is persisted
// - A registry for id/value lookups, pre-loadable with known defaults
// - A row projection of its own fields

pub mod property_value;
pub mod real_estate;
pub mod service_provider;

pub use property_value::{RealPropertyValues, RealPropertyValuesRegistry};
pub use real_estate::{Address, RealEstate, RealEstateRegistry};
pub use service_provider::{
    ProviderClass, ProviderKind, ServiceProvider, ServiceProviderRegistry,
};
