//! Pattern registry: field type to attribute substrings.
//!
//! Site quirks (a page naming its full-name input `fname`) are handled by listing the token as a
//! pattern, never by special-casing the matcher.

use std::collections::HashMap;

use fastfill_core_types::FieldType;

const FULL_NAME: &[&str] = &[
    "fname",
    "name",
    "pilgrimname",
    "pilgrim_name",
    "passengername",
    "passenger_name",
    "fullname",
    "full_name",
    "pname",
    "username",
    "user_name",
    "devotee_name",
    "devoteename",
    "personname",
    "person_name",
];

const AGE: &[&str] = &[
    "age",
    "pilgrimage",
    "pilgrim_age",
    "passengerage",
    "passenger_age",
    "devotee_age",
    "devoteeage",
    "personage",
    "person_age",
];

const GENDER: &[&str] = &[
    "gender",
    "sex",
    "pilgrimgender",
    "pilgrim_gender",
    "passengergender",
    "passenger_gender",
    "pgender",
    "devotee_gender",
    "devoteegender",
    "persongender",
];

const PHONE: &[&str] = &[
    "phone",
    "mobile",
    "contact",
    "phonenumber",
    "mobilenumber",
    "phone_number",
    "mobile_number",
    "contactnumber",
    "contact_number",
    "mobileno",
    "phoneno",
    "cellphone",
];

const EMAIL: &[&str] = &[
    "email",
    "mail",
    "emailid",
    "email_id",
    "e_mail",
    "emailaddress",
    "email_address",
    "mailid",
];

const ID_TYPE: &[&str] = &[
    "photoidtype",
    "photoidproof",
    "photo_id_proof",
    "photo_id_type",
    "idproof",
    "id_proof",
    "idtype",
    "id_type",
    "idcard",
    "id_card",
    "documenttype",
    "document_type",
    "prooftype",
    "proof_type",
    "identitytype",
    "identity_type",
];

const ID_NUMBER: &[&str] = &[
    "idproofnumber",
    "photoidnumber",
    "photo_id_number",
    "photoidno",
    "photo_id_no",
    "idnumber",
    "id_number",
    "idno",
    "id_no",
    "idcard_no",
    "documentnumber",
    "document_number",
    "cardnumber",
    "card_number",
    "proofnumber",
    "proof_number",
    "identitynumber",
    "aadhaar",
    "aadhar",
    "pan",
    "passport",
];

const ADDRESS: &[&str] = &[
    "address",
    "street",
    "addr",
    "address1",
    "address_line",
    "addressline1",
    "streetaddress",
    "street_address",
];

const CITY: &[&str] = &["city", "town", "cityname", "city_name", "townname"];

const STATE: &[&str] = &["state", "province", "statename", "state_name"];

const PINCODE: &[&str] = &[
    "pincode",
    "pin",
    "zip",
    "zipcode",
    "postal",
    "postalcode",
    "postal_code",
    "pinno",
    "pin_code",
];

const COUNTRY: &[&str] = &["country", "countryname", "country_name", "countrycode"];

fn builtin(field: FieldType) -> &'static [&'static str] {
    match field {
        FieldType::FullName => FULL_NAME,
        FieldType::Age => AGE,
        FieldType::Gender => GENDER,
        FieldType::Phone => PHONE,
        FieldType::Email => EMAIL,
        FieldType::IdType => ID_TYPE,
        FieldType::IdNumber => ID_NUMBER,
        FieldType::Address => ADDRESS,
        FieldType::City => CITY,
        FieldType::State => STATE,
        FieldType::Pincode => PINCODE,
        FieldType::Country => COUNTRY,
    }
}

/// Immutable once built. Patterns are stored lower-case and deduplicated.
#[derive(Clone, Debug)]
pub struct PatternRegistry {
    table: HashMap<FieldType, Vec<String>>,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            table: HashMap::new(),
        };
        for field in FieldType::ALL {
            registry.extend(field, builtin(field).iter().copied());
        }
        registry
    }

    /// Adds site-specific tokens for `field`.
    pub fn with_extra<I, S>(mut self, field: FieldType, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(field, patterns);
        self
    }

    fn extend<I, S>(&mut self, field: FieldType, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.table.entry(field).or_default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if !pattern.is_empty() && !entry.contains(&pattern) {
                entry.push(pattern);
            }
        }
    }

    pub fn patterns_for(&self, field: FieldType) -> &[String] {
        self.table.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lookup by profile key. Unknown keys have no patterns.
    pub fn patterns_for_key(&self, key: &str) -> &[String] {
        match key.parse::<FieldType>() {
            Ok(field) => self.patterns_for(field),
            Err(_) => &[],
        }
    }

    /// First pattern of `field` found in `attributes`, compared case-insensitively.
    pub fn first_hit(&self, field: FieldType, attributes: &str) -> Option<&str> {
        let haystack = attributes.to_lowercase();
        self.patterns_for(field)
            .iter()
            .find(|pattern| haystack.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_lowercase_patterns() {
        let registry = PatternRegistry::builtin();
        for field in FieldType::ALL {
            let patterns = registry.patterns_for(field);
            assert!(!patterns.is_empty(), "{field}");
            assert!(patterns.iter().all(|p| *p == p.to_lowercase()));
        }
    }

    #[test]
    fn unknown_key_yields_empty() {
        let registry = PatternRegistry::builtin();
        assert!(registry.patterns_for_key("nickname").is_empty());
        assert!(!registry.patterns_for_key("idType").is_empty());
    }

    #[test]
    fn extra_patterns_are_normalised_and_deduplicated() {
        let registry =
            PatternRegistry::builtin().with_extra(FieldType::FullName, ["Devotee1", "FNAME", " "]);
        let patterns = registry.patterns_for(FieldType::FullName);
        assert_eq!(patterns.iter().filter(|p| *p == "fname").count(), 1);
        assert!(patterns.contains(&"devotee1".to_string()));
    }

    #[test]
    fn hits_are_case_insensitive() {
        let registry = PatternRegistry::builtin();
        assert_eq!(
            registry.first_hit(FieldType::IdType, "photoIdType mat-input-element"),
            Some("photoidtype")
        );
        assert_eq!(registry.first_hit(FieldType::Email, "fname"), None);
    }
}
