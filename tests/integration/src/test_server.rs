//! Live server integration tests.

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use para_auth::QueryParams;
    use para_client::ParaClient;
    use para_core::{Constraint, ParaObject};
    use serde_json::Value;

    use crate::{para_client, para_client_with_keys, send, test_object_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_read_and_delete_object() {
        let client = para_client();
        let id = test_object_name("obj");
        let mut obj = ParaObject::new().with_type("itpost").with_id(&id).with_name("hello");
        obj.add_property("rating", 5);

        let (status, body) = send(client.create_request(&obj)).await.expect("create");
        assert!(status.is_success(), "create failed: {status}");
        let created: ParaObject = ParaClient::read_entity(&body).expect("entity").expect("body");
        assert_eq!(created.id.as_deref(), Some(id.as_str()));

        let (status, body) = send(client.read_request(Some("itpost"), &id).expect("read"))
            .await
            .expect("read");
        assert_eq!(status, StatusCode::OK);
        let read: ParaObject = ParaClient::read_entity(&body).expect("entity").expect("body");
        assert_eq!(read.name.as_deref(), Some("hello"));
        assert_eq!(read.property("rating"), Some(&serde_json::json!(5)));

        let (status, _) = send(client.invoke_delete(&read.object_uri(), QueryParams::new()))
            .await
            .expect("delete");
        assert!(status.is_success(), "delete failed: {status}");

        let (status, body) = send(client.read_request(None, &id).expect("read"))
            .await
            .expect("read after delete");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!ParaClient::error_message(status, &body).is_empty());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_bad_secret() {
        let access_key = para_client().config().access_key.clone();
        let client = para_client_with_keys(&access_key, "definitely-not-the-secret");

        let (status, _) = send(client.invoke_get("itpost", QueryParams::new()))
            .await
            .expect("send");
        assert!(
            status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN,
            "expected 401 or 403, got {status}"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_add_and_remove_validation_constraint() {
        let client = para_client();
        let object_type = test_object_name("type");

        let request = client
            .add_validation_constraint_request(&object_type, "title", &Constraint::Size { min: 1, max: 10 })
            .expect("add request");
        let (status, body) = send(request).await.expect("add");
        assert!(status.is_success(), "add constraint failed: {status}");
        let constraints: Value = ParaClient::read_entity(&body).expect("entity").expect("body");
        assert!(constraints.get(&object_type).is_some(), "constraints: {constraints}");

        let request = client
            .remove_validation_constraint_request(&object_type, "title", "size")
            .expect("remove request");
        let (status, _) = send(request).await.expect("remove");
        assert!(status.is_success(), "remove constraint failed: {status}");
    }
}
