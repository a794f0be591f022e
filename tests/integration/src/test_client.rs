//! Client integration tests that run without a server.
//!
//! Every request the client builds must verify against the app's secret.

#[cfg(test)]
mod tests {
    use http::Method;
    use para_auth::{
        CredentialProvider, QueryParams, SignedRequest, SignerConfig, StaticCredentialProvider,
        verify_signature,
    };
    use para_client::ParaClient;
    use para_core::{ClientConfig, Constraint, ParaObject};
    use serde_json::json;

    const ACCESS_KEY: &str = "app:blog";
    const SECRET_KEY: &str = "blog-secret-key";

    fn client() -> ParaClient {
        ParaClient::new(
            ClientConfig::builder()
                .endpoint("http://localhost:8080")
                .access_key(ACCESS_KEY)
                .secret_key(SECRET_KEY)
                .build(),
            SignerConfig::default(),
        )
    }

    fn assert_verifies(request: SignedRequest) {
        let provider = StaticCredentialProvider::new(vec![(
            ACCESS_KEY.to_owned(),
            SECRET_KEY.to_owned(),
        )]);
        let provider: &dyn CredentialProvider = &provider;
        let description = format!("{} {}", request.method, request.url);
        let (parts, body) = request.into_http_request().unwrap().into_parts();

        let verified = verify_signature(&parts, &body, provider, &SignerConfig::default())
            .unwrap_or_else(|e| panic!("{description} should verify: {e}"));
        assert_eq!(verified.access_key_id, ACCESS_KEY);
    }

    #[test]
    fn test_should_sign_every_object_request() {
        let client = client();
        let mut post = ParaObject::new().with_type("post").with_name("Hello world");
        post.add_property("rating", 5);

        assert_verifies(client.create_request(&post));
        assert_verifies(client.create_request(&post.clone().with_id("p 1")));
        assert_verifies(client.read_request(Some("post"), "p 1").unwrap());
        assert_verifies(client.read_request(None, "p1").unwrap());
        assert_verifies(client.invoke_patch("post/p1", Some(&json!({"rating": 4}))));
        assert_verifies(client.invoke_delete("post/p1", QueryParams::new()));
        assert_verifies(client.invoke_get("search", QueryParams::new().with("q", "type:post")));
    }

    #[test]
    fn test_should_sign_constraint_requests() {
        let client = client();
        let constraints = [
            Constraint::Required,
            Constraint::Size { min: 1, max: 20 },
            Constraint::Pattern("^[a-z]+$".to_owned()),
        ];

        for constraint in &constraints {
            let request = client
                .add_validation_constraint_request("post", "title", constraint)
                .unwrap();
            assert_eq!(request.method, Method::PUT);
            assert!(request.url.ends_with(&format!("/_constraints/post/title/{}", constraint.name())));
            assert_verifies(request);
        }

        assert_verifies(
            client
                .remove_validation_constraint_request("post", "title", "required")
                .unwrap(),
        );
    }

    #[test]
    fn test_should_switch_to_bearer_after_sign_in() {
        let client = client();
        assert_verifies(client.sign_in_request("password", "alice:pass").unwrap());

        let user = client
            .apply_sign_in_response(&json!({
                "user": {"id": "u1", "type": "user", "name": "Alice"},
                "jwt": {"access_token": "header.payload.sig", "expires": 1, "refresh": 0},
            }))
            .unwrap();
        assert_eq!(user.name.as_deref(), Some("Alice"));

        let request = client.invoke_get("me", QueryParams::new());
        assert_eq!(request.header("Authorization"), Some("Bearer header.payload.sig"));

        client.sign_out();
        assert_verifies(client.invoke_get("me", QueryParams::new()));
    }

    #[test]
    fn test_should_read_created_object_from_response_body() {
        let body = br#"{"id":"p1","type":"post","timestamp":1700000000000,"rating":5,"draft":null}"#;
        let obj: ParaObject = ParaClient::read_entity(body).unwrap().unwrap();

        assert_eq!(obj.object_uri(), "/post/p1");
        assert_eq!(obj.created_at(), Some(1_700_000_000_000));
        assert_eq!(obj.property("rating"), Some(&json!(5)));
        assert!(!obj.has_property("draft"));
    }
}
