//! IdP metadata.
//!
//! Rules need four facts about the IdP under test: its entity ID, where
//! its single sign-on endpoints are, whether it supports single logout,
//! and the certificate it signs with. [`IdpMetadataProvider`] is that
//! contract; [`IdpMetadata`] reads it from a SAML metadata document.

use std::path::Path;

use base64::Engine;
use ctk_protocol_saml::constants::{MD_NS, XMLDSIG_NS};
use ctk_protocol_saml::xml::{self, Element};
use ctk_protocol_saml::Binding;
use tracing::debug;

use crate::error::{SpiError, SpiResult};

/// What the rules need to know about the IdP under test.
pub trait IdpMetadataProvider: Send + Sync {
    /// The IdP entity ID.
    fn entity_id(&self) -> &str;

    /// Single sign-on endpoint for `binding`, if advertised.
    fn sso_location(&self, binding: Binding) -> Option<&str>;

    /// Returns true if the IdP advertises a single logout endpoint.
    fn supports_single_logout(&self) -> bool;

    /// DER encoded signing certificate, if published.
    fn signing_certificate(&self) -> Option<&[u8]>;
}

/// Metadata read from an `EntityDescriptor` with an `IDPSSODescriptor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdpMetadata {
    entity_id: String,
    sso: Vec<(Binding, String)>,
    slo: Vec<(Binding, String)>,
    signing_certificate: Option<Vec<u8>>,
}

impl IdpMetadata {
    /// Creates metadata for `entity_id` with no endpoints.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Adds a single sign-on endpoint.
    #[must_use]
    pub fn with_sso(mut self, binding: Binding, location: impl Into<String>) -> Self {
        self.sso.push((binding, location.into()));
        self
    }

    /// Adds a single logout endpoint.
    #[must_use]
    pub fn with_single_logout(mut self, binding: Binding, location: impl Into<String>) -> Self {
        self.slo.push((binding, location.into()));
        self
    }

    /// Sets the DER encoded signing certificate.
    #[must_use]
    pub fn with_signing_certificate(mut self, der: Vec<u8>) -> Self {
        self.signing_certificate = Some(der);
        self
    }

    /// Reads metadata from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not usable metadata.
    pub fn from_file(path: &Path) -> SpiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let metadata = Self::from_xml(&content)?;
        debug!(path = %path.display(), entity_id = %metadata.entity_id, "loaded IdP metadata");
        Ok(metadata)
    }

    /// Parses a metadata document.
    ///
    /// The root may be an `EntityDescriptor` or an `EntitiesDescriptor`; the
    /// first entity carrying an `IDPSSODescriptor` is used. Only SSO and SLO
    /// endpoints on the Redirect and POST bindings are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not XML, has no IdP entity, or
    /// the entity has no `entityID`.
    pub fn from_xml(content: &str) -> SpiResult<Self> {
        let document = xml::parse(content).map_err(|e| SpiError::Metadata(e.to_string()))?;
        let root = document.root();

        let entity = std::iter::once(root)
            .chain(root.descendants())
            .filter(|el| el.is(MD_NS, "EntityDescriptor"))
            .find(|el| el.child(MD_NS, "IDPSSODescriptor").is_some())
            .ok_or_else(|| SpiError::Metadata("no EntityDescriptor with an IDPSSODescriptor".into()))?;

        let entity_id = entity
            .attr("entityID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SpiError::Metadata("EntityDescriptor has no entityID".into()))?;

        let mut metadata = Self::new(entity_id);
        let Some(idp) = entity.child(MD_NS, "IDPSSODescriptor") else {
            return Ok(metadata);
        };

        metadata.sso = endpoints(idp, "SingleSignOnService");
        metadata.slo = endpoints(idp, "SingleLogoutService");
        metadata.signing_certificate = signing_certificate(idp)?;
        Ok(metadata)
    }

    /// Single logout endpoint for `binding`, if advertised.
    #[must_use]
    pub fn slo_location(&self, binding: Binding) -> Option<&str> {
        self.slo
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, location)| location.as_str())
    }
}

impl IdpMetadataProvider for IdpMetadata {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn sso_location(&self, binding: Binding) -> Option<&str> {
        self.sso
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, location)| location.as_str())
    }

    fn supports_single_logout(&self) -> bool {
        !self.slo.is_empty()
    }

    fn signing_certificate(&self) -> Option<&[u8]> {
        self.signing_certificate.as_deref()
    }
}

fn endpoints(idp: &Element, name: &str) -> Vec<(Binding, String)> {
    idp.children_named(MD_NS, name)
        .filter_map(|service| {
            let binding = Binding::from_uri(service.attr("Binding")?)?;
            Some((binding, service.attr("Location")?.to_string()))
        })
        .collect()
}

fn signing_certificate(idp: &Element) -> SpiResult<Option<Vec<u8>>> {
    let key = idp
        .children_named(MD_NS, "KeyDescriptor")
        .find(|kd| matches!(kd.attr("use"), None | Some("signing")));
    let Some(cert) = key.and_then(|kd| kd.descendants_named(XMLDSIG_NS, "X509Certificate").into_iter().next())
    else {
        return Ok(None);
    };

    let text: String = cert.text().chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(Some)
        .map_err(|e| SpiError::Metadata(format!("signing certificate is not base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata"
    xmlns:ds="http://www.w3.org/2000/09/xmldsig#" entityID="https://idp.example.com/metadata">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="encryption">
      <ds:KeyInfo><ds:X509Data><ds:X509Certificate>ZW5j</ds:X509Certificate></ds:X509Data></ds:KeyInfo>
    </md:KeyDescriptor>
    <md:KeyDescriptor use="signing">
      <ds:KeyInfo><ds:X509Data><ds:X509Certificate>
        c2ln
        bmVk
      </ds:X509Certificate></ds:X509Data></ds:KeyInfo>
    </md:KeyDescriptor>
    <md:SingleLogoutService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect"
        Location="https://idp.example.com/slo"/>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
        Location="https://idp.example.com/sso/post"/>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect"
        Location="https://idp.example.com/sso/redirect"/>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:SOAP"
        Location="https://idp.example.com/sso/soap"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#;

    #[test]
    fn parses_idp_descriptor() {
        let metadata = IdpMetadata::from_xml(METADATA).unwrap();
        assert_eq!(metadata.entity_id(), "https://idp.example.com/metadata");
        assert_eq!(
            metadata.sso_location(Binding::Post),
            Some("https://idp.example.com/sso/post")
        );
        assert_eq!(
            metadata.sso_location(Binding::Redirect),
            Some("https://idp.example.com/sso/redirect")
        );
        assert!(metadata.supports_single_logout());
        assert_eq!(metadata.slo_location(Binding::Post), None);
        assert_eq!(metadata.signing_certificate(), Some(b"signed".as_slice()));
    }

    #[test]
    fn finds_idp_inside_entities_descriptor() {
        let wrapped = format!(
            r#"<md:EntitiesDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata">
  <md:EntityDescriptor entityID="https://sp.example.com"><md:SPSSODescriptor/></md:EntityDescriptor>
  {}
</md:EntitiesDescriptor>"#,
            METADATA.replace(r#"xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata""#, "")
        );
        let metadata = IdpMetadata::from_xml(&wrapped).unwrap();
        assert_eq!(metadata.entity_id(), "https://idp.example.com/metadata");
    }

    #[test]
    fn missing_entity_id_is_an_error() {
        let xml = r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata">
  <md:IDPSSODescriptor/></md:EntityDescriptor>"#;
        assert!(matches!(IdpMetadata::from_xml(xml), Err(SpiError::Metadata(_))));
    }

    #[test]
    fn sp_only_metadata_is_an_error() {
        let xml = r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata"
            entityID="https://sp.example.com"><md:SPSSODescriptor/></md:EntityDescriptor>"#;
        assert!(IdpMetadata::from_xml(xml).is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idp.xml");
        std::fs::write(&path, METADATA).unwrap();
        let metadata = IdpMetadata::from_file(&path).unwrap();
        assert!(metadata.signing_certificate().is_some());

        let missing = IdpMetadata::from_file(&dir.path().join("absent.xml"));
        assert!(matches!(missing, Err(SpiError::Io(_))));
    }

    #[test]
    fn builder_without_slo() {
        let metadata = IdpMetadata::new("https://idp").with_sso(Binding::Post, "https://idp/sso");
        assert!(!metadata.supports_single_logout());
        assert_eq!(metadata.signing_certificate(), None);
    }
}
