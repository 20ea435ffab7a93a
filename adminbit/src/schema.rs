use crate::error::AppError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Input type of one editable field. Dates and emails are carried as text,
/// `Number` is enforced numeric at the coercion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Date,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number)
    }
}

/// One editable attribute of a record. Immutable, declared once per collection at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn required(name: &str, label: &str, field_type: FieldType) -> Self {
        Self { name: name.to_string(), label: label.to_string(), field_type, required: true }
    }

    pub fn optional(name: &str, label: &str, field_type: FieldType) -> Self {
        Self { name: name.to_string(), label: label.to_string(), field_type, required: false }
    }
}

/// Ordered field list of one named collection. Field names are unique, `id` is reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl CollectionSchema {
    pub fn new(name: &str, fields: Vec<FieldDescriptor>) -> Result<Self, AppError> {
        for (i, field) in fields.iter().enumerate() {
            if field.name == "id" {
                return Err(AppError::BadRequest(format!("collection `{name}` declares the reserved field `id`")));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(AppError::BadRequest(format!("collection `{name}` declares field `{}` twice", field.name)));
            }
        }
        Ok(Self { name: name.to_string(), fields })
    }
}

/// Static mapping from collection name to its ordered field descriptors.
/// Pure configuration, no side effects; unknown names resolve to an empty field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: Vec<CollectionSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<CollectionSchema>) -> Result<Self, AppError> {
        for (i, schema) in schemas.iter().enumerate() {
            if schemas[..i].iter().any(|s| s.name == schema.name) {
                return Err(AppError::BadRequest(format!("collection `{}` is declared twice", schema.name)));
            }
        }
        Ok(Self { schemas })
    }

    /// Registry of the four demo collections the console manages out of the box.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Re-checks the registry invariants, for registries deserialized from config.
    pub fn validate(&self) -> Result<(), AppError> {
        Self::new(self.schemas.clone()).map(|_| ())
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.schemas.iter().any(|s| s.name == collection)
    }

    /// Ordered field descriptors of a collection, empty for an unknown name.
    pub fn fields(&self, collection: &str) -> &[FieldDescriptor] {
        self.schemas
            .iter()
            .find(|s| s.name == collection)
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.schemas.iter().map(|s| s.name.clone()).collect()
    }
}

static BUILTIN: Lazy<SchemaRegistry> = Lazy::new(|| {
    build_builtin().expect("builtin schemas are well formed")
});

fn build_builtin() -> Result<SchemaRegistry, AppError> {
    use FieldType::*;
    SchemaRegistry::new(vec![
        CollectionSchema::new(
            "users",
            vec![
                FieldDescriptor::required("name", "Name", Text),
                FieldDescriptor::required("email", "Email", Email),
                FieldDescriptor::optional("created_at", "Created at", Date),
            ],
        )?,
        CollectionSchema::new(
            "products",
            vec![
                FieldDescriptor::required("name", "Product name", Text),
                FieldDescriptor::required("price", "Price", Number),
                FieldDescriptor::required("category", "Category", Text),
                FieldDescriptor::required("stock", "Stock", Number),
            ],
        )?,
        CollectionSchema::new(
            "orders",
            vec![
                FieldDescriptor::required("user_id", "User id", Number),
                FieldDescriptor::required("total", "Total", Number),
                FieldDescriptor::required("status", "Status", Text),
                FieldDescriptor::optional("created_at", "Created at", Date),
            ],
        )?,
        CollectionSchema::new(
            "categories",
            vec![
                FieldDescriptor::required("name", "Name", Text),
                FieldDescriptor::optional("description", "Description", Text),
            ],
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_resolve_unknown_collections_to_an_empty_field_list() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.fields("nonexistent").is_empty());
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn it_should_keep_field_order_as_declared() {
        let registry = SchemaRegistry::builtin();
        let names: Vec<&str> = registry.fields("products").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "price", "category", "stock"]);
    }

    #[test]
    fn it_should_reject_duplicate_field_names() {
        let result = CollectionSchema::new(
            "broken",
            vec![
                FieldDescriptor::required("name", "Name", FieldType::Text),
                FieldDescriptor::optional("name", "Name again", FieldType::Text),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn it_should_reject_the_reserved_id_field() {
        let result = CollectionSchema::new("broken", vec![FieldDescriptor::required("id", "Id", FieldType::Number)]);
        assert!(result.is_err());
    }

    #[test]
    fn it_should_deserialize_a_registry_from_config_shape() {
        let json = r#"[{"name":"notes","fields":[{"name":"title","label":"Title","type":"text","required":true}]}]"#;
        let registry: SchemaRegistry = serde_json::from_str(json).expect("registry json");
        registry.validate().expect("valid registry");
        assert_eq!(registry.fields("notes").len(), 1);
        assert_eq!(registry.fields("notes")[0].field_type, FieldType::Text);
    }
}
