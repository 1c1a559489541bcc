use crate::spec_code::SpecCode;

/// Compiled-in descriptions of every [`SpecCode`].
pub(crate) const MESSAGES: &[(SpecCode, &str)] = &[
    (SpecCode::General_a, "Signatures MUST be valid under the signing key published in the IdP metadata."),
    (SpecCode::Schema, "The message MUST be a well-formed document conforming to the SAML 2.0 schemas."),

    (SpecCode::Core_1_3_1_a, "String values MUST consist of at least one non-whitespace character."),
    (SpecCode::Core_1_3_2_a, "URI reference values MUST be absolute and contain at least one non-whitespace character."),
    (SpecCode::Core_1_3_3_a, "Time values MUST be expressed in UTC form, with no time zone component other than Z."),
    (SpecCode::Core_1_3_4_a, "Identifier values MUST be unique within the scope of the message."),
    (SpecCode::Core_2_3_3_a, "The Version attribute of an <Assertion> MUST be \"2.0\"."),
    (SpecCode::Core_2_3_3_b, "An <Assertion> MUST carry an ID attribute."),
    (SpecCode::Core_2_3_3_c, "An <Assertion> MUST carry an IssueInstant attribute in UTC."),
    (SpecCode::Core_2_3_3_d, "An <Assertion> MUST contain exactly one <Issuer> element."),
    (SpecCode::Core_2_3_3_e, "An <Assertion> with no statements MUST contain a <Subject> element."),
    (SpecCode::Core_2_5_1_b, "A <Conditions> element MUST NOT contain more than one <OneTimeUse> element."),
    (SpecCode::Core_2_5_1_c, "A <Conditions> element MUST NOT contain more than one <ProxyRestriction> element."),
    (SpecCode::Core_2_5_1_2_a, "When both are present, NotBefore MUST be earlier than NotOnOrAfter."),
    (SpecCode::Core_2_7_2_a, "An assertion containing an <AuthnStatement> MUST contain a <Subject> element."),
    (SpecCode::Core_2_7_3_a, "An assertion containing an <AttributeStatement> MUST contain a <Subject> element."),
    (SpecCode::Core_3_2_2_a, "A response MUST carry an ID attribute."),
    (SpecCode::Core_3_2_2_b, "InResponseTo MUST equal the ID of the request the response answers."),
    (SpecCode::Core_3_2_2_c, "The Version attribute of a response MUST be \"2.0\"."),
    (SpecCode::Core_3_2_2_d, "The IssueInstant of a response MUST be expressed in UTC."),
    (SpecCode::Core_3_2_2_e, "When present, Destination MUST be the URI the response was sent to."),
    (SpecCode::Core_3_2_2_2_a, "The first-level <StatusCode> MUST be one of the top-level status codes."),
    (SpecCode::Core_3_3_2_3_a, "An <AttributeQuery> MUST NOT contain two <Attribute> elements with the same Name and NameFormat."),
    (SpecCode::Core_3_4_a, "A successful authentication response MUST contain at least one <AuthnStatement>."),
    (SpecCode::Core_3_4_1_4_a, "The response to an <AuthnRequest> MUST be a <Response> containing one or more assertions."),
    (SpecCode::Core_3_4_1_4_c, "Every assertion returned for an <AuthnRequest> MUST contain a <Subject>."),
    (SpecCode::Core_3_4_1_4_d, "At least one returned assertion MUST contain an <AuthnStatement>."),
    (SpecCode::Core_3_4_1_4_e, "Returned assertions MUST be restricted to the requesting service provider as an <Audience>."),
    (SpecCode::Core_3_7_1_a, "The Reason attribute of a <LogoutRequest> MUST be a URI reference."),
    (SpecCode::Core_3_7_1_b, "A <LogoutRequest> MUST identify the principal with a <BaseID>, <NameID> or <EncryptedID>."),
    (SpecCode::Core_4_1_2_a, "The SAML major and minor version MUST be 2.0."),
    (SpecCode::Core_4_2_a, "SAML elements MUST use the SAML 2.0 namespace names."),
    (SpecCode::Core_5_4_2_a, "A signature MUST contain exactly one <Reference> whose URI is \"#\" followed by the signed element's ID."),
    (SpecCode::Core_8_2_2_a, "An attribute with the uri NameFormat MUST have a Name that is a URI reference."),
    (SpecCode::Core_8_2_3_a, "An attribute with the basic NameFormat MUST have a Name that is a valid xs:Name."),
    (SpecCode::Core_8_3_2_a, "An emailAddress identifier MUST be in the form local-part@domain."),
    (SpecCode::Core_8_3_6_a, "An entity identifier MUST NOT carry NameQualifier, SPNameQualifier or SPProvidedID."),
    (SpecCode::Core_8_3_6_b, "An entity identifier MUST NOT exceed 1024 characters."),
    (SpecCode::Core_8_3_7_a, "A persistent identifier MUST NOT exceed 256 characters."),
    (SpecCode::Core_8_3_7_b, "The NameQualifier of a persistent identifier MUST be the issuing IdP's entity ID."),
    (SpecCode::Core_8_3_8_a, "A transient identifier MUST NOT exceed 256 characters."),

    (SpecCode::Bindings_3_1_2_1_a, "The signing key MUST be usable for the declared signature algorithm."),
    (SpecCode::Bindings_3_4_3_a, "RelayState MUST NOT exceed 80 bytes."),
    (SpecCode::Bindings_3_4_3_b, "The responder MUST return the exact RelayState it received with the request."),
    (SpecCode::Bindings_3_4_4_a, "SAMLEncoding, when present, MUST be a URI identifying the encoding."),
    (SpecCode::Bindings_3_4_4_b, "The message MUST be carried in a SAMLRequest or SAMLResponse query parameter."),
    (SpecCode::Bindings_3_4_4_1_a, "The DEFLATE encoding MUST NOT include an enveloped signature in the message."),
    (SpecCode::Bindings_3_4_4_1_b, "The message MUST be compressed with raw DEFLATE and contain no line feeds or whitespace."),
    (SpecCode::Bindings_3_4_4_1_c, "The compressed message MUST be base64 encoded."),
    (SpecCode::Bindings_3_4_4_1_d, "RelayState MUST be URL-encoded in the query string."),
    (SpecCode::Bindings_3_4_4_1_e, "A signed message MUST carry a SigAlg parameter naming a supported algorithm URI."),
    (SpecCode::Bindings_3_4_4_1_f, "The Signature parameter MUST verify over the SAMLResponse, RelayState and SigAlg parameters."),
    (SpecCode::Bindings_3_4_4_1_g, "A signed message MUST carry the base64 signature value in a Signature parameter."),
    (SpecCode::Bindings_3_4_5_2_a, "A signed message MUST carry a Destination equal to the URL it was sent to."),
    (SpecCode::Bindings_3_4_6_a, "The HTTP response MUST use status code 302 or 303."),
    (SpecCode::Bindings_3_5_3_a, "RelayState MUST NOT exceed 80 bytes."),
    (SpecCode::Bindings_3_5_3_b, "The responder MUST return the exact RelayState it received with the request."),
    (SpecCode::Bindings_3_5_4_a, "The form control value MUST be the base64 encoding of the message."),
    (SpecCode::Bindings_3_5_4_b, "The message MUST be carried in a SAMLRequest or SAMLResponse form control."),
    (SpecCode::Bindings_3_5_5_2_a, "A signed message MUST carry a Destination equal to the URL it was sent to."),
    (SpecCode::Bindings_3_5_6_a, "The HTTP response MUST NOT carry an error status code."),

    (SpecCode::Profiles_4_1_2_a, "The IdP MUST NOT use the HTTP-Redirect binding to deliver the <Response>."),
    (SpecCode::Profiles_4_1_4_2_a, "A signed <Response> MUST contain exactly one <Issuer> equal to the IdP entity ID, in entity format if a Format is given."),
    (SpecCode::Profiles_4_1_4_2_b, "A successful <Response> MUST contain at least one <Assertion>."),
    (SpecCode::Profiles_4_1_4_2_c, "Every assertion MUST contain an <Issuer> equal to the IdP entity ID, in entity format if a Format is given."),
    (SpecCode::Profiles_4_1_4_2_e, "At least one assertion MUST contain a bearer <SubjectConfirmation>."),
    (SpecCode::Profiles_4_1_4_2_f, "A bearer confirmation MUST carry Recipient, NotOnOrAfter and InResponseTo, and no NotBefore."),
    (SpecCode::Profiles_4_1_4_2_g, "At least one bearer assertion MUST contain an <AuthnStatement>."),
    (SpecCode::Profiles_4_1_4_2_h, "When the IdP supports single logout, the <AuthnStatement> MUST carry a SessionIndex."),
    (SpecCode::Profiles_4_1_4_2_i, "Each bearer assertion MUST contain an <AudienceRestriction> naming the service provider."),
    (SpecCode::Profiles_4_1_4_2_j, "An error <Response> MUST NOT contain any assertion."),
    (SpecCode::Profiles_4_1_4_5_a, "Over the HTTP-POST binding the <Response> or its assertions MUST be signed."),
    (SpecCode::Profiles_4_4_4_1_a, "A <LogoutRequest> MUST contain an <Issuer> equal to the IdP entity ID, in entity format if a Format is given."),
    (SpecCode::Profiles_4_4_4_1_b, "A <LogoutRequest> MUST be signed."),
    (SpecCode::Profiles_4_4_4_2_a, "A <LogoutResponse> MUST contain an <Issuer> equal to the IdP entity ID, in entity format if a Format is given."),
    (SpecCode::Profiles_4_4_4_2_b, "A <LogoutResponse> MUST be signed."),
];
