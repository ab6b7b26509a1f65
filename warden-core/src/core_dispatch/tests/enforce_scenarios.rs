/*
    Attribute enforcement scenarios: locked reverts (kick ordering
    included), canonical adoption, and join-link prevention restoration.
*/

use super::{aid, gid, group, scenario, Scenario};
use crate::config::EngineTunables;
use crate::core_platform::{GroupAttribute, Operation, PlatformClient};
use crate::core_policy::{LockKind, PolicyStore, ProtectionPolicy};

fn changed(group: &str, actor: &str, attribute: GroupAttribute) -> Operation {
    Operation::GroupAttributeChanged { group: gid(group), actor: aid(actor), attribute }
}

fn protected(s: &Scenario, locks: &[LockKind]) {
    let mut policy = ProtectionPolicy::new(gid("g1"), aid("admin"));
    for kind in locks {
        match kind {
            LockKind::Name => policy.name_locked = true,
            LockKind::Picture => policy.picture_locked = true,
            LockKind::Url => policy.url_locked = true,
            LockKind::Invite => policy.invite_locked = true,
        }
    }
    policy.canonical_name = Some("Alpha".to_string());
    policy.canonical_picture = Some("pic-0".to_string());
    s.store.create_policy(&policy).unwrap();
}

#[tokio::test]
async fn test_locked_rename_kicks_then_restores() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "evil"]));
    protected(&s, &[LockKind::Name]);

    // The offender renames the group out from under us.
    s.platform.client("evil").update_group(&group("g1", "Hacked", true, &[])).await.unwrap();

    s.dispatcher.dispatch(changed("g1", "evil", GroupAttribute::Name)).await;

    let snapshot = s.platform.group(&gid("g1")).unwrap();
    assert_eq!(snapshot.name, "Alpha");
    assert!(!snapshot.members.contains(&aid("evil")));

    // The offender must be out before the name is rewritten.
    let kicks = s.call_positions("kick_from_group", &["w1"]);
    let restores = s.call_positions("update_group", &["w1"]);
    assert_eq!(kicks.len(), 1);
    assert_eq!(restores.len(), 1);
    assert!(kicks[0] < restores[0]);
}

#[tokio::test]
async fn test_unlocked_rename_adopts_new_canonical() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "member"]));
    protected(&s, &[]);

    s.platform.client("member").update_group(&group("g1", "Beta", true, &[])).await.unwrap();

    s.dispatcher.dispatch(changed("g1", "member", GroupAttribute::Name)).await;

    assert_eq!(s.platform.group(&gid("g1")).unwrap().name, "Beta");
    let policy = s.store.policy(&gid("g1")).unwrap().unwrap();
    assert_eq!(policy.canonical_name.as_deref(), Some("Beta"));
    assert!(s.call_positions("kick_from_group", &["w0", "w1"]).is_empty());
}

#[tokio::test]
async fn test_admin_rename_survives_name_lock() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "admin"]));
    protected(&s, &[LockKind::Name]);

    s.platform.client("admin").update_group(&group("g1", "Season 2", true, &[])).await.unwrap();

    s.dispatcher.dispatch(changed("g1", "admin", GroupAttribute::Name)).await;

    assert_eq!(s.platform.group(&gid("g1")).unwrap().name, "Season 2");
    let policy = s.store.policy(&gid("g1")).unwrap().unwrap();
    assert_eq!(policy.canonical_name.as_deref(), Some("Season 2"));
    assert!(s.call_positions("kick_from_group", &["w0", "w1"]).is_empty());
}

#[tokio::test]
async fn test_locked_picture_change_is_reverted() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "evil"]));
    protected(&s, &[LockKind::Picture]);

    let mut defaced = group("g1", "Alpha", true, &[]);
    defaced.picture_ref = "pic-evil".to_string();
    s.platform.client("evil").update_group(&defaced).await.unwrap();

    s.dispatcher.dispatch(changed("g1", "evil", GroupAttribute::Picture)).await;

    let snapshot = s.platform.group(&gid("g1")).unwrap();
    assert_eq!(snapshot.picture_ref, "pic-0");
    assert!(!snapshot.members.contains(&aid("evil")));
}

#[tokio::test]
async fn test_url_lock_restores_ticket_prevention() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    // The offender already flipped prevention off to open the join link.
    s.platform.add_group(group("g1", "Alpha", false, &["w0", "w1", "evil"]));
    protected(&s, &[LockKind::Url]);

    s.dispatcher.dispatch(changed("g1", "evil", GroupAttribute::TicketPrevention)).await;

    let snapshot = s.platform.group(&gid("g1")).unwrap();
    assert!(snapshot.prevented_join_by_ticket);
    assert!(!snapshot.members.contains(&aid("evil")));
}

#[tokio::test]
async fn test_unprotected_group_is_ignored() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "member"]));

    s.platform.client("member").update_group(&group("g1", "Beta", true, &[])).await.unwrap();
    s.dispatcher.dispatch(changed("g1", "member", GroupAttribute::Name)).await;

    assert_eq!(s.platform.group(&gid("g1")).unwrap().name, "Beta");
    assert!(s.call_positions("kick_from_group", &["w0", "w1"]).is_empty());
    assert!(s.store.policy(&gid("g1")).unwrap().is_none());
}
