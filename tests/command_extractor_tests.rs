use mentor::commands::extractor::{
    extract_commands, extract_file_ops, extract_mentor_report, extract_milestone_ops, fenced_body, CommandTag,
};
use serde_json::json;

#[tokio::test]
async fn test_no_fence_is_absent() {
    let text = "Think about how your components share state. What would own the list?";
    let commands = extract_commands(text);
    assert!(commands.is_empty());
}

#[tokio::test]
async fn test_file_ops_block_parsed() {
    let text = "Let's scaffold it.\n```FILE_OPS\n[{\"action\":\"create\",\"path\":\"/src/a.ts\",\"content\":\"x\"}]\n```\nNow open the file.";
    assert_eq!(
        extract_file_ops(text),
        Some(json!([{ "action": "create", "path": "/src/a.ts", "content": "x" }]))
    );
}

#[tokio::test]
async fn test_unterminated_fence_is_absent() {
    let text = "```FILE_OPS\n[{\"action\":\"create\",\"path\":\"/a\"}]\n";
    assert_eq!(fenced_body(text, CommandTag::FileOps), None);
    assert_eq!(extract_file_ops(text), None);
}

#[tokio::test]
async fn test_malformed_body_is_absent_never_partial() {
    let text = "```MILESTONE_OPS\n[{\"action\":\"update_task\",\"task_id\":\"t1\"},\n```";
    assert!(fenced_body(text, CommandTag::MilestoneOps).is_some());
    assert_eq!(extract_milestone_ops(text), None);
}

#[tokio::test]
async fn test_tags_are_independent() {
    let text = "Review done.\n\
```MENTOR_REPORT\n{\"score\": 7, \"notes\": [\"tests missing\"]}\n```\n\
```FILE_OPS\n{ this is not json }\n```\n\
```MILESTONE_OPS\n{\"action\":\"update_milestone\",\"milestone_id\":\"m1\",\"status\":\"done\"}\n```\n";

    let commands = extract_commands(text);
    assert_eq!(commands.file_ops, None);
    assert_eq!(
        commands.mentor_report.map(|r| r.0),
        Some(json!({ "score": 7, "notes": ["tests missing"] }))
    );
    assert_eq!(
        commands.milestone_ops,
        Some(json!({ "action": "update_milestone", "milestone_id": "m1", "status": "done" }))
    );
}

#[tokio::test]
async fn test_first_block_per_tag_wins() {
    let text = "```FILE_OPS\n[1]\n```\nand again\n```FILE_OPS\n[2]\n```";
    assert_eq!(extract_file_ops(text), Some(json!([1])));
}

#[tokio::test]
async fn test_tag_prefix_does_not_match() {
    let text = "```FILE_OPS_V2\n[1]\n```\n```FILE_OPS\n[2]\n```";
    assert_eq!(extract_file_ops(text), Some(json!([2])));
}

#[tokio::test]
async fn test_body_is_trimmed_and_may_share_line() {
    let text = "```MENTOR_REPORT   {\"ok\": true}   ```";
    assert_eq!(extract_mentor_report(text).map(|r| r.0), Some(json!({ "ok": true })));
}

#[tokio::test]
async fn test_plain_code_fences_are_ignored() {
    let text = "Example:\n```ts\nconst a = 1;\n```\nNo commands here.";
    assert!(extract_commands(text).is_empty());
}

#[tokio::test]
async fn test_body_may_follow_tag_directly() {
    let text = "```FILE_OPS[{\"action\":\"delete\",\"path\":\"/a\"}]```";
    assert_eq!(extract_file_ops(text), Some(json!([{ "action": "delete", "path": "/a" }])));

    let text = "```MENTOR_REPORT{\"ok\": true}```";
    assert_eq!(extract_mentor_report(text).map(|r| r.0), Some(json!({ "ok": true })));
}
