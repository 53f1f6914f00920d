use crate::models::{Attributes, Payload, Row};
use serde_json::{Value, json};

const ITEM_NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;
const BULLET_MAX: usize = 1000;
const UPC_MIN_LEN: usize = 11;
const DEFAULT_BRAND: &str = "Generic";

/// Turns inventory rows into listing attribute payloads for one language.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    language: String,
}

impl PayloadBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn build_payload(&self, product_type: &str, row: &Row) -> Payload {
        let mut attributes = Attributes::new();

        if let Some(title) = clean_value(row.title.as_deref()) {
            attributes.insert(
                "item_name".into(),
                vec![self.localized(&truncate(title, ITEM_NAME_MAX))],
            );
        }

        let brand = clean_value(row.brand.as_deref()).unwrap_or(DEFAULT_BRAND);
        attributes.insert("brand".into(), vec![self.localized(brand)]);
        attributes.insert("manufacturer".into(), vec![self.localized(brand)]);

        if let Some(description) = clean_value(row.description.as_deref()) {
            attributes.insert(
                "product_description".into(),
                vec![self.localized(&truncate(description, DESCRIPTION_MAX))],
            );
        }

        let bullets: Vec<Value> = row
            .bullets()
            .into_iter()
            .filter_map(clean_value)
            .map(|bullet| self.localized(&truncate(bullet, BULLET_MAX)))
            .collect();
        if !bullets.is_empty() {
            attributes.insert("bullet_point".into(), bullets);
        }

        if let Some(mpn) = clean_value(row.part_number.as_deref()) {
            attributes.insert("part_number".into(), vec![json!({ "value": mpn })]);
            attributes.insert("model_number".into(), vec![json!({ "value": mpn })]);
        }

        if let Some(upc) = clean_value(row.upc.as_deref()).and_then(clean_upc) {
            attributes.insert(
                "externally_assigned_product_identifier".into(),
                vec![json!({ "type": "upc", "value": upc })],
            );
        }

        if let Some(image) = clean_value(row.image.as_deref()) {
            attributes.insert(
                "main_product_image_locator".into(),
                vec![json!({ "media_location": image })],
            );
        }

        attributes.insert("unit_count".into(), vec![json!({ "value": 1, "type": "count" })]);
        attributes.insert("number_of_items".into(), vec![json!({ "value": 1 })]);
        attributes.insert(
            "supplier_declared_dg_hz_regulation".into(),
            vec![json!({ "value": "not_applicable" })],
        );
        attributes.insert(
            "item_type_keyword".into(),
            vec![self.localized(&item_type_keyword(product_type))],
        );

        Payload {
            product_type: product_type.to_string(),
            attributes,
        }
    }

    fn localized(&self, value: &str) -> Value {
        json!({ "value": value, "language_tag": self.language })
    }
}

/// Validates the payload attributes against a product type schema. Any
/// violation, or a schema that does not compile, rejects the payload.
pub fn validate(payload: &Payload, schema: &Value) -> bool {
    match check(payload, schema) {
        Ok(()) => true,
        Err(errors) => {
            tracing::debug!(
                target = "listing.pipeline",
                product_type = %payload.product_type,
                errors = ?errors,
                "payload_rejected"
            );
            false
        }
    }
}

pub fn check(payload: &Payload, schema: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft201909)
        .build(schema)
        .map_err(|err| vec![format!("schema did not compile: {err}")])?;
    let instance =
        serde_json::to_value(&payload.attributes).map_err(|err| vec![err.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|error| {
            let path = error.instance_path().to_string();
            let path = if path.is_empty() { "root".to_string() } else { path };
            format!("{path}: {error}")
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Trimmed value, or `None` when missing, blank, or the literal `nan` that
/// spreadsheet exports leave in empty numeric cells.
pub fn clean_value(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed)
    }
}

fn clean_upc(raw: &str) -> Option<String> {
    let upc = raw.strip_suffix(".0").unwrap_or(raw);
    (upc.chars().count() >= UPC_MIN_LEN).then(|| upc.to_string())
}

fn item_type_keyword(product_type: &str) -> String {
    let spaced = product_type.to_lowercase().replace('_', " ");
    match spaced.strip_suffix("part") {
        Some(head) if head.is_empty() || head.ends_with(' ') => format!("{head}parts"),
        _ => spaced,
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new("en_US")
    }

    fn full_row() -> Row {
        Row {
            sku: Some("SKU-9".into()),
            title: Some("  Washer Drain Pump W10276397  ".into()),
            brand: Some("Whirlpool".into()),
            description: Some("Replacement drain pump.".into()),
            bullet_1: Some("Fits most top-load washers".into()),
            bullet_2: Some("nan".into()),
            bullet_3: Some("OEM quality".into()),
            bullet_4: None,
            bullet_5: Some("   ".into()),
            part_number: Some("W10276397".into()),
            upc: Some("123456789012.0".into()),
            image: Some("https://img.example/pump.jpg".into()),
        }
    }

    #[test]
    fn cleaning_rule() {
        assert_eq!(clean_value(None), None);
        assert_eq!(clean_value(Some("   ")), None);
        assert_eq!(clean_value(Some("NaN")), None);
        assert_eq!(clean_value(Some(" nan ")), None);
        assert_eq!(clean_value(Some("  Bosch ")), Some("Bosch"));
    }

    #[test]
    fn full_row_maps_every_attribute() {
        let payload = builder().build_payload("MAJOR_HOME_APPLIANCES_PART", &full_row());
        let attrs = &payload.attributes;
        assert_eq!(payload.product_type, "MAJOR_HOME_APPLIANCES_PART");
        assert_eq!(
            attrs["item_name"][0],
            json!({"value": "Washer Drain Pump W10276397", "language_tag": "en_US"})
        );
        assert_eq!(attrs["brand"], attrs["manufacturer"]);
        assert_eq!(attrs["brand"][0]["value"], json!("Whirlpool"));
        assert_eq!(attrs["bullet_point"].len(), 2);
        assert_eq!(attrs["bullet_point"][1]["value"], json!("OEM quality"));
        assert_eq!(attrs["part_number"], vec![json!({"value": "W10276397"})]);
        assert_eq!(attrs["model_number"], attrs["part_number"]);
        assert_eq!(
            attrs["externally_assigned_product_identifier"][0],
            json!({"type": "upc", "value": "123456789012"})
        );
        assert_eq!(
            attrs["main_product_image_locator"][0],
            json!({"media_location": "https://img.example/pump.jpg"})
        );
        assert_eq!(
            attrs["item_type_keyword"][0]["value"],
            json!("major home appliances parts")
        );
    }

    #[test]
    fn empty_row_keeps_only_constant_attributes() {
        let payload = builder().build_payload("REPLACEMENT_PART", &Row::default());
        let keys: Vec<&str> = payload.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "brand",
                "item_type_keyword",
                "manufacturer",
                "number_of_items",
                "supplier_declared_dg_hz_regulation",
                "unit_count",
            ]
        );
        assert_eq!(payload.attributes["brand"][0]["value"], json!("Generic"));
        assert_eq!(
            payload.attributes["unit_count"],
            vec![json!({"value": 1, "type": "count"})]
        );
        assert_eq!(payload.attributes["number_of_items"], vec![json!({"value": 1})]);
        assert_eq!(
            payload.attributes["supplier_declared_dg_hz_regulation"],
            vec![json!({"value": "not_applicable"})]
        );
    }

    #[test]
    fn upc_cleaning_and_length_gate() {
        assert_eq!(clean_upc("123456789012.0").as_deref(), Some("123456789012"));
        assert_eq!(clean_upc("1234.0"), None);
        assert_eq!(clean_upc("12345678901").as_deref(), Some("12345678901"));

        let mut row = full_row();
        row.upc = Some("1234.0".into());
        let payload = builder().build_payload("REPLACEMENT_PART", &row);
        assert!(
            !payload
                .attributes
                .contains_key("externally_assigned_product_identifier")
        );
    }

    #[test]
    fn long_fields_are_truncated_by_characters() {
        let row = Row {
            title: Some("é".repeat(250)),
            description: Some("d".repeat(2500)),
            bullet_1: Some("b".repeat(1200)),
            ..Row::default()
        };
        let payload = builder().build_payload("REPLACEMENT_PART", &row);
        let len = |key: &str| {
            payload.attributes[key][0]["value"]
                .as_str()
                .map(|s| s.chars().count())
        };
        assert_eq!(len("item_name"), Some(200));
        assert_eq!(len("product_description"), Some(2000));
        assert_eq!(len("bullet_point"), Some(1000));
    }

    #[test]
    fn item_type_keyword_pluralises_trailing_part_only() {
        assert_eq!(item_type_keyword("REPLACEMENT_PART"), "replacement parts");
        assert_eq!(item_type_keyword("HOME_APPLIANCE_ACCESSORY"), "home appliance accessory");
        assert_eq!(item_type_keyword("AUTO_PARTS"), "auto parts");
        assert_eq!(item_type_keyword("PART"), "parts");
        assert_eq!(item_type_keyword("COUNTERPART"), "counterpart");
    }

    #[test]
    fn schema_requiring_brand_accepts_payload() {
        let schema = json!({
            "type": "object",
            "required": ["brand"],
            "properties": {"brand": {"type": "array", "minItems": 1}}
        });
        let payload = builder().build_payload("REPLACEMENT_PART", &Row::default());
        assert!(validate(&payload, &schema));
    }

    #[test]
    fn schema_requiring_unproduced_attribute_rejects_payload() {
        let schema = json!({"type": "object", "required": ["color"]});
        let payload = builder().build_payload("REPLACEMENT_PART", &full_row());
        assert!(!validate(&payload, &schema));
        let errors = check(&payload, &schema).expect_err("missing color");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("color"));
    }

    #[test]
    fn uncompilable_schema_rejects_payload() {
        let schema = json!({"type": 12});
        let payload = builder().build_payload("REPLACEMENT_PART", &Row::default());
        assert!(!validate(&payload, &schema));
    }
}
