//! Planning Center entity manifest
//!
//! Static endpoint definitions for the People API, folded into an
//! [`EntityManifest`] at adapter construction.

use steeple_adapter::endpoint::{EndpointDefinition, EndpointDescriptor, HttpMethod};
use steeple_adapter::manifest::EntityManifest;
use steeple_adapter::transform::FieldMap;
use steeple_adapter::types::RemoteOperation;

fn definition(
    entity: &str,
    operation: RemoteOperation,
    descriptor: EndpointDescriptor,
    fields: FieldMap,
) -> EndpointDefinition {
    EndpointDefinition {
        entity: entity.to_string(),
        module: "people".to_string(),
        external_type: entity.to_string(),
        operation,
        descriptor,
        fields,
    }
}

fn person_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("first_name", "firstName")
        .map("last_name", "lastName")
        .map("birthdate", "birthday")
        .map("gender", "gender")
        .map("status", "status")
        .map("created_at", "createdAt")
        .map("updated_at", "updatedAt")
}

fn address_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("street", "street")
        .map("city", "city")
        .map("state", "state")
        .map("zip", "zip")
        .map("location", "location")
        .map("primary", "primary")
}

fn email_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("address", "address")
        .map("location", "location")
        .map("primary", "primary")
}

fn phone_number_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("number", "number")
        .map("location", "location")
        .map("primary", "primary")
}

fn campus_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("name", "name")
        .map("city", "city")
        .map("country", "country")
}

/// Build the People-module manifest.
#[must_use]
pub fn pco_manifest() -> EntityManifest {
    let mut defs = Vec::new();

    // Person
    defs.push(definition(
        "Person",
        RemoteOperation::List,
        {
            let mut d = EndpointDescriptor::new(HttpMethod::Get, "/people/v2/people");
            d.queryable = vec![
                "first_name".into(),
                "last_name".into(),
                "status".into(),
                "created_at".into(),
                "updated_at".into(),
            ];
            d.orderable = vec!["last_name".into(), "created_at".into(), "updated_at".into()];
            d.includes = vec!["addresses".into(), "emails".into(), "phone_numbers".into()];
            d
        },
        person_fields(),
    ));
    defs.push(definition(
        "Person",
        RemoteOperation::Get,
        EndpointDescriptor::new(HttpMethod::Get, "/people/v2/people/:person_id"),
        person_fields(),
    ));
    defs.push(definition(
        "Person",
        RemoteOperation::Create,
        {
            let mut d = EndpointDescriptor::new(HttpMethod::Post, "/people/v2/people");
            d.creatable = vec!["first_name".into(), "last_name".into(), "birthdate".into()];
            d
        },
        person_fields(),
    ));
    defs.push(definition(
        "Person",
        RemoteOperation::Update,
        {
            let mut d = EndpointDescriptor::new(HttpMethod::Patch, "/people/v2/people/:person_id");
            d.updatable = vec![
                "first_name".into(),
                "last_name".into(),
                "birthdate".into(),
                "status".into(),
            ];
            d
        },
        person_fields(),
    ));
    defs.push(definition(
        "Person",
        RemoteOperation::Delete,
        EndpointDescriptor::new(HttpMethod::Delete, "/people/v2/people/:person_id"),
        person_fields(),
    ));

    // Address
    defs.push(definition(
        "Address",
        RemoteOperation::List,
        EndpointDescriptor::new(HttpMethod::Get, "/people/v2/addresses"),
        address_fields(),
    ));
    defs.push(definition(
        "Address",
        RemoteOperation::Update,
        EndpointDescriptor::new(HttpMethod::Patch, "/people/v2/addresses/:address_id"),
        address_fields(),
    ));
    defs.push(definition(
        "Address",
        RemoteOperation::Delete,
        EndpointDescriptor::new(HttpMethod::Delete, "/people/v2/addresses/:address_id"),
        address_fields(),
    ));

    // Email
    defs.push(definition(
        "Email",
        RemoteOperation::List,
        EndpointDescriptor::new(HttpMethod::Get, "/people/v2/emails"),
        email_fields(),
    ));
    defs.push(definition(
        "Email",
        RemoteOperation::Update,
        EndpointDescriptor::new(HttpMethod::Patch, "/people/v2/emails/:email_id"),
        email_fields(),
    ));

    // PhoneNumber
    defs.push(definition(
        "PhoneNumber",
        RemoteOperation::List,
        EndpointDescriptor::new(HttpMethod::Get, "/people/v2/phone_numbers"),
        phone_number_fields(),
    ));
    defs.push(definition(
        "PhoneNumber",
        RemoteOperation::Update,
        EndpointDescriptor::new(
            HttpMethod::Patch,
            "/people/v2/phone_numbers/:phone_number_id",
        ),
        phone_number_fields(),
    ));

    // Campus: readable for reference data, excluded from sync.
    defs.push(definition(
        "Campus",
        RemoteOperation::List,
        EndpointDescriptor::new(HttpMethod::Get, "/people/v2/campuses").with_skip_sync(),
        campus_fields(),
    ));

    EntityManifest::from_definitions(defs)
}
