/*
    Invitation handling scenarios: claim flow, whitelist rejection,
    capacity ceiling, and invite-lock cancellation.
*/

use super::{aid, gid, group, scenario};
use crate::config::EngineTunables;
use crate::core_platform::Operation;
use crate::core_policy::{PolicyStore, ProtectionPolicy};
use std::time::Duration;

fn invited(group: &str, inviter: &str, invitees: &[&str]) -> Operation {
    Operation::InvitedIntoGroup {
        group: gid(group),
        inviter: aid(inviter),
        invitees: invitees.iter().map(|i| aid(i)).collect(),
    }
}

#[tokio::test]
async fn test_whitelisted_invitation_claims_group() {
    let mut tunables = EngineTunables::default();
    tunables.greeting = Some("on duty".to_string());
    let s = scenario(&["w0", "w1", "w2"], tunables);

    let long_name = "x".repeat(60);
    let members: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
    let member_refs: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
    s.platform.add_group(group("g1", &long_name, true, &member_refs));
    s.platform.add_pending_invite(&gid("g1"), &aid("w0"), &aid("admin"));
    s.store.set_whitelisted(&aid("admin"), None).unwrap();

    s.dispatcher.dispatch(invited("g1", "admin", &["w0"])).await;

    // Every identity is in, and prevention ended up back on.
    let snapshot = s.platform.group(&gid("g1")).unwrap();
    for w in ["w0", "w1", "w2"] {
        assert!(snapshot.members.contains(&aid(w)), "{w} did not join");
    }
    assert!(snapshot.prevented_join_by_ticket);

    // The responders joined by a ticket minted after the claim started.
    let reissue = s.call_positions("reissue_invitation_ticket", &["w0"]);
    let joins = s.call_positions("accept_invitation_by_ticket", &["w1", "w2"]);
    assert_eq!(joins.len(), 2);
    assert!(reissue[0] < joins[0]);

    // Policy row created for the inviter, canonical name truncated.
    let policy = s.store.policy(&gid("g1")).unwrap().unwrap();
    assert_eq!(policy.inviter, aid("admin"));
    assert_eq!(policy.canonical_name.as_deref().map(str::len), Some(50));
    assert_eq!(policy.canonical_picture.as_deref(), Some("pic-0"));

    let greetings = s.platform.messages();
    assert_eq!(greetings.len(), 1);
    assert_eq!(greetings[0].2, "on duty");
}

#[tokio::test]
async fn test_non_whitelisted_invitation_is_rejected() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["stranger"]));
    s.platform.add_pending_invite(&gid("g1"), &aid("w0"), &aid("stranger"));

    s.dispatcher.dispatch(invited("g1", "stranger", &["w0"])).await;

    assert_eq!(s.call_positions("reject_invitation", &["w0"]).len(), 1);
    assert!(s.call_positions("accept_invitation", &["w0"]).is_empty());
    assert!(s.store.policy(&gid("g1")).unwrap().is_none());
    let snapshot = s.platform.group(&gid("g1")).unwrap();
    assert!(!snapshot.members.contains(&aid("w0")));
}

#[tokio::test]
async fn test_full_group_is_not_joined() {
    let mut tunables = EngineTunables::default();
    tunables.group_capacity = 5;
    let s = scenario(&["w0", "w1"], tunables);

    s.platform.add_group(group("g1", "Alpha", true, &["a", "b", "c", "d", "e"]));
    s.platform.add_pending_invite(&gid("g1"), &aid("w0"), &aid("admin"));
    s.store.set_whitelisted(&aid("admin"), None).unwrap();

    s.dispatcher.dispatch(invited("g1", "admin", &["w0"])).await;

    assert!(s.call_positions("accept_invitation", &["w0"]).is_empty());
    assert!(s.store.policy(&gid("g1")).unwrap().is_none());
}

#[tokio::test]
async fn test_invite_lock_cancels_third_party_invitations() {
    let s = scenario(&["w0", "w1", "w2"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "w2", "evil"]));

    let mut policy = ProtectionPolicy::new(gid("g1"), aid("admin"));
    policy.invite_locked = true;
    s.store.create_policy(&policy).unwrap();

    s.platform.add_pending_invite(&gid("g1"), &aid("x"), &aid("evil"));
    s.platform.add_pending_invite(&gid("g1"), &aid("y"), &aid("evil"));

    s.dispatcher.dispatch(invited("g1", "evil", &["x", "y"])).await;

    // Cancellation runs detached from the handler.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(s.platform.pending_invitees(&gid("g1")).is_empty());
    assert_eq!(s.call_positions("cancel_invitation", &["w1", "w2"]).len(), 2);
}

#[tokio::test]
async fn test_authorized_inviter_is_left_alone() {
    let s = scenario(&["w0", "w1"], EngineTunables::default());
    s.platform.add_group(group("g1", "Alpha", true, &["w0", "w1", "admin"]));

    let mut policy = ProtectionPolicy::new(gid("g1"), aid("admin"));
    policy.invite_locked = true;
    s.store.create_policy(&policy).unwrap();
    s.platform.add_pending_invite(&gid("g1"), &aid("x"), &aid("admin"));

    s.dispatcher.dispatch(invited("g1", "admin", &["x"])).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(s.platform.pending_invitees(&gid("g1")), vec![aid("x")]);
    assert!(s.call_positions("cancel_invitation", &["w0", "w1"]).is_empty());
}
