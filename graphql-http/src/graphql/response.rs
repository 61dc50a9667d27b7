use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;

use crate::graphql::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// The result of executing a GraphQL request: `{ data?, errors?, extensions? }`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional graphql extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>, extensions: Map<ByteString, Value>) -> Self {
        Self {
            data,
            errors,
            extensions,
        }
    }

    /// The response fields as a JSON object, in `data`, `errors`, `extensions` order.
    ///
    /// `errors` and `extensions` are left out when empty. Fails if an error cannot be
    /// serialized.
    pub fn to_map(&self) -> Result<Object, serde_json::Error> {
        let mut map = Object::new();
        if let Some(data) = &self.data {
            map.insert("data", data.clone());
        }
        if !self.errors.is_empty() {
            map.insert(
                "errors",
                Value::Array(
                    self.errors
                        .iter()
                        .map(serde_json_bytes::to_value)
                        .collect::<Result<_, _>>()?,
                ),
            );
        }
        if !self.extensions.is_empty() {
            map.insert("extensions", Value::Object(self.extensions.clone()));
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;
    use crate::graphql::Location;
    use crate::json_ext::Path;
    use crate::json_ext::PathElement;

    #[test]
    fn to_map_keeps_present_fields_only() {
        let response = Response::builder()
            .data(json!({ "hero": { "name": "R2-D2" } }))
            .build();

        assert_eq!(
            Value::Object(response.to_map().unwrap()),
            json!({ "data": { "hero": { "name": "R2-D2" } } })
        );
    }

    #[test]
    fn to_map_keeps_null_data_next_to_errors() {
        let response = Response::builder()
            .data(Value::Null)
            .error(Error::builder().message("boom").build())
            .extension("cost", 3)
            .build();

        assert_eq!(
            Value::Object(response.to_map().unwrap()),
            json!({
                "data": null,
                "errors": [{ "message": "boom" }],
                "extensions": { "cost": 3 }
            })
        );
    }

    #[test]
    fn to_map_renders_every_error_field() {
        let response = Response::builder()
            .error(
                Error::builder()
                    .message("Cannot return null for non-nullable field")
                    .location(Location { line: 2, column: 5 })
                    .path(Path(vec![
                        PathElement::from("hero"),
                        PathElement::from("friends"),
                        PathElement::from(1),
                    ]))
                    .extension_code("NULL_FIELD")
                    .build(),
            )
            .build();

        assert_eq!(
            Value::Object(response.to_map().unwrap()),
            json!({
                "errors": [{
                    "message": "Cannot return null for non-nullable field",
                    "locations": [{ "line": 2, "column": 5 }],
                    "path": ["hero", "friends", 1],
                    "extensions": { "code": "NULL_FIELD" }
                }]
            })
        );
    }

    #[test]
    fn serialized_form_matches_to_map() {
        let response = Response::builder()
            .error(Error::builder().message("boom").extension_code("E").build())
            .build();

        assert_eq!(
            serde_json_bytes::to_value(&response).unwrap(),
            Value::Object(response.to_map().unwrap())
        );
    }
}
