//! Integration tests for document sharing through GraphQL
//!
//! Documents are stored through the repositories; links are added with the
//! share mutations and inspected with `documentLinks` / `documentAudience`.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use campus::db::courses::{COURSE_STATUS_STUDENT, COURSE_STATUS_TEACHER};
use campus::db::{CourseRecord, CreateCourse, Database, UserRecord};
use campus::resource::{Document, Resource, Visibility};

use common::*;

struct Fixture {
    app: TestApp,
    teacher: UserRecord,
    student: UserRecord,
    course: CourseRecord,
    /// Root folder owned by the admin
    root: Document,
}

async fn fixture() -> Fixture {
    let app = setup().await;
    let admin = create_admin(&app.db).await;
    let teacher = create_user(&app.db, "teacher", "Tess", "Teacher").await;
    let student = create_user(&app.db, "student", "Sam", "Student").await;

    let course = app.db.courses().create(CreateCourse::new("PHY", "Physics")).await.unwrap();
    app.db.courses().subscribe_user(course.id, teacher.id, COURSE_STATUS_TEACHER).await.unwrap();
    app.db.courses().subscribe_user(course.id, student.id, COURSE_STATUS_STUDENT).await.unwrap();

    let mut root = Document::folder("Physics documents");
    app.db.documents().create(&mut root, Some(admin.id)).await.unwrap();

    Fixture { app, teacher, student, course, root }
}

async fn child_document(db: &Database, root: &Document, title: &str, creator: Option<i64>) -> i64 {
    let mut doc = Document::new(title);
    doc.set_parent(root);
    let record = db.documents().create(&mut doc, creator).await.unwrap();
    record.iid
}

fn share_with_course(document_id: i64, course_id: i64, extra: &str) -> String {
    format!(
        r#"mutation {{
            shareDocumentWithCourse(input: {{ documentId: {document_id}, courseId: {course_id} {extra} }}) {{
                success
                links {{ courseId sessionId groupId visibility rights }}
            }}
        }}"#
    )
}

#[tokio::test]
async fn test_sharing_twice_keeps_one_link() {
    let f = fixture().await;
    let doc_id = child_document(&f.app.db, &f.root, "Optics", Some(f.teacher.id)).await;
    let query = share_with_course(doc_id, f.course.id, "visibility: DRAFT");

    let first = data(execute(&f.app, &query, Some(auth(&f.teacher))).await);
    let second = data(execute(&f.app, &query, Some(auth(&f.teacher))).await);

    let expected = json!([{
        "courseId": f.course.id,
        "sessionId": null,
        "groupId": null,
        "visibility": "DRAFT",
        "rights": ["ROLE_CURRENT_COURSE_TEACHER"],
    }]);
    assert_eq!(first["shareDocumentWithCourse"]["links"], expected);
    assert_eq!(second["shareDocumentWithCourse"]["links"], expected);

    let stored = f.app.db.documents().load(doc_id).await.unwrap().unwrap();
    assert_eq!(stored.resource_node().unwrap().links.len(), 1);
}

#[tokio::test]
async fn test_published_link_has_no_explicit_rights() {
    let f = fixture().await;
    let doc_id = child_document(&f.app.db, &f.root, "Waves", Some(f.teacher.id)).await;

    let body = data(
        execute(&f.app, &share_with_course(doc_id, f.course.id, ""), Some(auth(&f.teacher))).await,
    );
    assert_eq!(body["shareDocumentWithCourse"]["links"][0]["visibility"], "PUBLISHED");
    assert_eq!(body["shareDocumentWithCourse"]["links"][0]["rights"], json!([]));
}

#[tokio::test]
async fn test_course_teacher_may_share_published_document() {
    let f = fixture().await;
    let mut doc = Document::new("Mechanics");
    doc.set_parent(&f.root);
    doc.add_course_link(&f.course, None, None, Visibility::Published).unwrap();
    let record = f.app.db.documents().create(&mut doc, None).await.unwrap();

    let other = f.app.db.courses().create(CreateCourse::new("AST", "Astronomy")).await.unwrap();
    let body = data(
        execute(&f.app, &share_with_course(record.iid, other.id, ""), Some(auth(&f.teacher))).await,
    );
    assert_eq!(body["shareDocumentWithCourse"]["links"].as_array().unwrap().len(), 2);

    let response = execute(&f.app, &share_with_course(record.iid, other.id, ""), Some(auth(&f.student))).await;
    assert_eq!(error_code(&response).as_deref(), Some("FORBIDDEN"));
}

#[tokio::test]
async fn test_root_document_cannot_be_linked_to_course() {
    let f = fixture().await;
    let root_id = f.root.iid.unwrap();
    let admin = f.app.db.users().get_by_username("admin").await.unwrap().unwrap();

    let response = execute(&f.app, &share_with_course(root_id, f.course.id, ""), Some(auth(&admin))).await;
    assert_eq!(error_code(&response).as_deref(), Some("BAD_REQUEST"));
}

#[tokio::test]
async fn test_group_must_belong_to_course() {
    let f = fixture().await;
    let doc_id = child_document(&f.app.db, &f.root, "Lab", Some(f.teacher.id)).await;
    let other = f.app.db.courses().create(CreateCourse::new("BIO", "Biology")).await.unwrap();
    let group = f.app.db.groups().create(other.id, "Team A").await.unwrap();

    let query = format!(
        r#"mutation {{
            shareDocumentWithGroup(input: {{ documentId: {doc_id}, courseId: {}, groupId: {} }}) {{ success }}
        }}"#,
        f.course.id, group.iid
    );
    let response = execute(&f.app, &query, Some(auth(&f.teacher))).await;
    assert_eq!(error_code(&response).as_deref(), Some("BAD_REQUEST"));
}

#[tokio::test]
async fn test_user_links_narrow_the_audience() {
    let f = fixture().await;
    let doc_id = child_document(&f.app.db, &f.root, "Feedback", Some(f.teacher.id)).await;

    let audience_query = format!("{{ documentAudience(documentId: {doc_id}) {{ everyone userIds groupIds }} }}");
    let body = data(execute(&f.app, &audience_query, Some(auth(&f.teacher))).await);
    assert_eq!(body["documentAudience"]["everyone"], true);

    let share = format!(
        r#"mutation {{
            shareDocumentWithUsers(input: {{ documentId: {doc_id}, userIds: [{s}, {s}, 9999], courseId: {c} }}) {{
                links {{ userId courseId }}
            }}
        }}"#,
        s = f.student.id,
        c = f.course.id
    );
    let body = data(execute(&f.app, &share, Some(auth(&f.teacher))).await);
    assert_eq!(
        body["shareDocumentWithUsers"]["links"],
        json!([{"userId": f.student.id, "courseId": f.course.id}])
    );

    let body = data(execute(&f.app, &audience_query, Some(auth(&f.teacher))).await);
    assert_eq!(
        body["documentAudience"],
        json!({"everyone": false, "userIds": [f.student.id], "groupIds": []})
    );
}

#[tokio::test]
async fn test_students_see_published_links_only() {
    let f = fixture().await;
    let doc_id = child_document(&f.app.db, &f.root, "Exam", Some(f.teacher.id)).await;
    data(
        execute(
            &f.app,
            &share_with_course(doc_id, f.course.id, "visibility: DRAFT"),
            Some(auth(&f.teacher)),
        )
        .await,
    );

    let links_query = format!("{{ documentLinks(documentId: {doc_id}) {{ visibility }} }}");
    let response = execute(&f.app, &links_query, Some(auth(&f.student))).await;
    assert_eq!(error_code(&response).as_deref(), Some("FORBIDDEN"));

    let published = child_document(&f.app.db, &f.root, "Notes", Some(f.teacher.id)).await;
    data(
        execute(&f.app, &share_with_course(published, f.course.id, ""), Some(auth(&f.teacher))).await,
    );
    let links_query = format!("{{ documentLinks(documentId: {published}) {{ visibility }} }}");
    let body = data(execute(&f.app, &links_query, Some(auth(&f.student))).await);
    assert_eq!(body["documentLinks"], json!([{"visibility": "PUBLISHED"}]));
}

#[tokio::test]
async fn test_unknown_document_is_not_found() {
    let f = fixture().await;
    let response = execute(&f.app, &share_with_course(4242, f.course.id, ""), Some(auth(&f.teacher))).await;
    assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));
}
