//! Fan-in resolution scenarios over recorded history.
//!
//! Run with: `cargo test -p gantry-tests --test fanin_tests`

use gantry_scheduler::{FaninConfig, FaninError};
use gantry_tests::{
    ScheduleFixture, dep, dep_on, git, hg, in_folder, init_test_logging, latest_revisions,
    named_dep, package, plugin, svn,
};
use pretty_assertions::assert_eq;

#[test]
fn test_simple_diamond_converges_on_oldest_shared_revision() -> anyhow::Result<()> {
    //        /--> B --\
    //  git -> A        D
    //        \--> C --/
    init_test_logging();
    let mut u = ScheduleFixture::new();
    let repo = git("repoA");
    u.checkin_in_order(&repo, &["rev1", "rev2"]);

    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [dep(&a)]);
    let c = u.save_config_with("C", [dep(&a)]);
    let d = u.save_config_with("D", [dep(&b), dep(&c)]);

    let a_1 = u.run_and_pass(&a, &["rev1"])?;
    let a_2 = u.run_and_pass(&a, &["rev2"])?;
    let b_1 = u.run_and_pass(&b, &[&a_1])?;
    let b_2 = u.run_and_pass(&b, &[&a_2])?;
    let c_1 = u.run_and_pass(&c, &[&a_1])?;

    let given = u.mrs(&[(&dep(&b), &b_2), (&dep(&c), &c_1)])?;
    let resolved = u.resolve(&d.name, &given)?;

    assert_eq!(latest_revisions(&resolved), [b_1, c_1]);
    Ok(())
}

#[test]
fn test_exhausted_history_reports_no_compatible_revisions() -> anyhow::Result<()> {
    init_test_logging();
    let mut u = ScheduleFixture::new();
    let repo = git("repoA");
    u.checkin_in_order(&repo, &["rev1", "rev2"]);

    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [dep(&a)]);
    let c = u.save_config_with("C", [dep(&a)]);
    u.save_config_with("D", [dep(&b), dep(&c)]);

    let a_1 = u.run_and_pass(&a, &["rev1"])?;
    let a_2 = u.run_and_pass(&a, &["rev2"])?;
    let b_1 = u.run_and_pass(&b, &[&a_2])?;
    let c_1 = u.run_and_pass(&c, &[&a_1])?;

    let given = u.mrs(&[(&dep(&b), &b_1), (&dep(&c), &c_1)])?;
    let err = u.resolve("D", &given).unwrap_err();

    assert!(matches!(err, FaninError::FailedToFindCompatibleRevision { .. }));
    let message = err.to_string();
    assert!(message.contains("no compatible upstream revisions"), "{message}");
    assert!(message.contains("'D'"), "{message}");
    Ok(())
}

#[test]
fn test_pipeline_without_dependencies_keeps_given_revisions() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = git("repo");
    let other = hg("other");
    u.checkin_in_order(&repo, &["g1", "g2"]);
    u.checkin_in_order(&other, &["h1"]);
    u.save_config_with("D", [repo.clone(), other.clone()]);

    let given = u.mrs(&[(&repo, "g1"), (&other, "h1")])?;
    assert_eq!(u.resolve("D", &given)?, given);
    assert_eq!(u.report("D")?, None);
    Ok(())
}

#[test]
fn test_missing_direct_dependency_fails() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = git("repo");
    u.checkin_in_order(&repo, &["g1"]);
    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [repo.clone()]);
    u.save_config_with("D", [dep(&a), dep(&b)]);

    let a_1 = u.run_and_pass(&a, &["g1"])?;
    let given = u.mrs(&[(&dep(&a), &a_1)])?;

    let err = u.resolve("D", &given).unwrap_err();
    assert!(matches!(err, FaninError::MissingDirectDependency { .. }));
    Ok(())
}

#[test]
fn test_returns_previous_revisions_when_one_parent_failed() -> anyhow::Result<()> {
    //   git ----------
    //    |            |
    //   P1     P2     |
    //    \     /      |
    //      P3 <-------
    init_test_logging();
    let mut u = ScheduleFixture::new();
    let repo = git("git-url");
    u.checkin_in_order(&repo, &["g1", "g2"]);

    let p1 = u.save_config_with("P1", [repo.clone()]);
    let p2 = u.save_config_with("P2", [repo.clone()]);
    let p3 = u.save_config_with("P3", [dep(&p1), dep(&p2), repo.clone()]);

    let p1_1 = u.run_and_pass(&p1, &["g1"])?;
    let p2_1 = u.run_and_pass(&p2, &["g1"])?;
    u.run_and_pass(&p3, &[&p1_1, &p2_1, "g1"])?;

    let p1_2 = u.run_and_pass(&p1, &["g2"])?;
    u.run_and_fail(&p2, &["g2"])?;

    let given = u.mrs(&[(&dep(&p1), &p1_2), (&dep(&p2), &p2_1), (&repo, "g2")])?;
    let resolved = u.resolve(&p3.name, &given)?;

    assert_eq!(latest_revisions(&resolved), [p1_1, p2_1, "g1".to_string()]);
    Ok(())
}

#[test]
fn test_multiple_diamonds_on_same_pipelines() -> anyhow::Result<()> {
    //   |-------v
    //   |    /--P1--\
    //  git  hg       P3
    //   |    \--P2--/
    //   +-------^
    let mut u = ScheduleFixture::new();
    let hg = in_folder(hg("hg"), "folder1");
    let git = in_folder(git("git"), "folder2");
    u.checkin_in_order(&hg, &["h11", "h12"]);
    u.checkin_in_order(&git, &["g11", "g12", "g13"]);

    let p1 = u.save_config_with("p1", [hg.clone(), git.clone()]);
    let p2 = u.save_config_with("p2", [hg.clone(), git.clone()]);
    u.save_config_with("p3", [dep(&p1), dep(&p2)]);

    u.run_and_pass(&p1, &["h12", "g11"])?;
    let p2_1 = u.run_and_pass(&p2, &["h11", "g13"])?;
    let p1_2 = u.run_and_pass(&p1, &["h11", "g13"])?;
    let p2_2 = u.run_and_pass(&p2, &["h12", "g13"])?;

    let given = u.mrs(&[(&dep(&p1), &p1_2), (&dep(&p2), &p2_2)])?;
    let resolved = u.resolve("p3", &given)?;

    assert_eq!(latest_revisions(&resolved), [p1_2, p2_1]);
    Ok(())
}

#[test]
fn test_more_than_one_upstream_at_minimum_revision() -> anyhow::Result<()> {
    //       +----------
    //   /-->P1---\      v
    // git------> P3 -> P4
    //   \-->P2--/       ^
    //        +----------
    init_test_logging();
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "f");
    let p1 = u.save_config_with("p1", [repo.clone()]);
    let p2 = u.save_config_with("p2", [repo.clone()]);
    let p3 = u.save_config_with("p3", [dep(&p1), dep(&p2), repo.clone()]);
    let p4 = u.save_config_with("p4", [dep(&p1), dep(&p2), dep(&p3)]);

    u.checkin_in_order(&repo, &["g0"]);
    let p1_1 = u.run_and_pass(&p1, &["g0"])?;
    let p2_1 = u.run_and_pass(&p2, &["g0"])?;
    let p3_1 = u.run_and_pass(&p3, &[&p1_1, &p2_1, "g0"])?;
    u.run_and_pass(&p4, &[&p1_1, &p2_1, &p3_1])?;

    u.checkin_in_order(&repo, &["g1"]);
    let p1_2 = u.run_and_pass(&p1, &["g1"])?;

    u.checkin_in_order(&repo, &["g2"]);
    let p2_2 = u.run_and_pass(&p2, &["g2"])?;
    u.run_and_pass(&p3, &[&p1_2, &p2_2, "g2"])?;

    u.checkin_in_order(&repo, &["g3"]);
    let p1_3 = u.run_and_pass(&p1, &["g3"])?;
    let p2_3 = u.run_and_pass(&p2, &["g3"])?;
    let p3_3 = u.run_and_pass(&p3, &[&p1_3, &p2_3, "g3"])?;
    u.run_and_pass(&p4, &[&p1_3, &p2_3, &p3_3])?;

    let p2_4 = u.run_and_pass(&p2, &["g1"])?;
    let p3_4 = u.run_and_pass(&p3, &[&p1_2, &p2_4, "g1"])?;

    let given = u.mrs(&[(&dep(&p1), &p1_3), (&dep(&p2), &p2_4), (&dep(&p3), &p3_4)])?;
    let resolved = u.resolve("p4", &given)?;

    assert_eq!(latest_revisions(&resolved), [p1_2, p2_4, p3_4]);
    Ok(())
}

#[test]
fn test_ci_and_cd_phases_trigger_consistently() -> anyhow::Result<()> {
    //     -----> acceptance ----
    //     |        |           v
    //  build       |          staging ---> production
    //     |        v           ^
    //     ----->regression ----
    init_test_logging();
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "folder1");
    u.checkin_in_order(&repo, &["g1", "g2", "g3"]);

    let build = u.save_config_with("build", [repo.clone()]);
    let acceptance = u.save_config_with("acceptance", [dep(&build)]);
    let regression = u.save_config_with("regression", [dep(&build), dep(&acceptance)]);
    let staging = u.save_config_with("staging", [dep(&acceptance), dep(&regression)]);
    let production = u.save_config_with("production", [dep(&staging)]);

    let b_1 = u.run_and_pass(&build, &["g1"])?;
    let a_1 = u.run_and_pass(&acceptance, &[&b_1])?;
    let r_1 = u.run_and_pass(&regression, &[&b_1, &a_1])?;
    let s_1 = u.run_and_pass(&staging, &[&a_1, &r_1])?;
    u.run_and_pass(&production, &[&s_1])?;

    let b_2 = u.run_and_pass(&build, &["g2"])?;
    let given = u.mrs(&[(&dep(&build), &b_2), (&dep(&acceptance), &a_1)])?;
    let resolved = u.resolve("regression", &given)?;
    assert_eq!(latest_revisions(&resolved), [b_1.clone(), a_1.clone()]);

    let a_2 = u.run_and_pass(&acceptance, &[&b_2])?;
    let given = u.mrs(&[(&dep(&build), &b_2), (&dep(&acceptance), &a_2)])?;
    let resolved = u.resolve("regression", &given)?;
    assert_eq!(latest_revisions(&resolved), [b_2.clone(), a_2.clone()]);

    let r_2 = u.run_and_pass(&regression, &[&b_2, &a_2])?;
    let r_3 = u.run_and_pass(&regression, &[&b_1, &a_2])?;
    let given = u.mrs(&[(&dep(&acceptance), &a_2), (&dep(&regression), &r_3)])?;
    let resolved = u.resolve("staging", &given)?;
    assert_eq!(latest_revisions(&resolved), [a_2.clone(), r_2.clone()]);

    let s_2 = u.run_and_pass(&staging, &[&a_2, &r_2])?;
    let s_3 = u.run_and_pass(&staging, &[&a_2, &r_3])?;
    let given = u.mrs(&[(&dep(&staging), &s_3)])?;
    let resolved = u.resolve("production", &given)?;
    assert_eq!(latest_revisions(&resolved), [s_2]);

    let b_3 = u.run_and_pass(&build, &["g3"])?;
    let a_3 = u.run_and_pass(&acceptance, &[&b_3])?;
    let r_4 = u.run_and_pass(&regression, &[&b_3, &a_3])?;
    u.run_and_pass(&staging, &[&a_3, &r_1])?;
    u.run_and_pass(&staging, &[&a_1, &r_4])?;
    let given = u.mrs(&[(&dep(&acceptance), &a_3), (&dep(&regression), &r_4)])?;
    let resolved = u.resolve("staging", &given)?;
    assert_eq!(latest_revisions(&resolved), [a_3.clone(), r_4]);

    let r_5 = u.run_and_pass(&regression, &[&b_3, &a_3])?;
    let given = u.mrs(&[(&dep(&acceptance), &a_3), (&dep(&regression), &r_5)])?;
    let resolved = u.resolve("staging", &given)?;
    assert_eq!(latest_revisions(&resolved), [a_3, r_5]);
    Ok(())
}

#[test]
fn test_dependency_material_names_come_from_configuration() -> anyhow::Result<()> {
    //  g -> up  -> down
    //        +-> mid -+
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "folder1");
    u.checkin_in_order(&repo, &["g1"]);

    let up = u.save_config_with("up", [repo.clone()]);
    let mid = u.save_config_with("mid", [named_dep(&up, "up-for-mid")]);
    let up_for_down = named_dep(&up, "up-for-down");
    let down = u.save_config_with("down", [dep(&mid), up_for_down.clone()]);

    let up_1 = u.run_and_pass(&up, &["g1"])?;
    let mid_1 = u.run_and_pass(&mid, &[&up_1])?;
    u.run_and_pass(&down, &[&mid_1, &up_1])?;

    let given = u.mrs(&[(&dep(&mid), &mid_1), (&up_for_down, &up_1)])?;
    let resolved = u.resolve("down", &given)?;

    assert_eq!(resolved, given);
    let names: Vec<Option<&str>> = resolved.iter().map(|r| r.material.name()).collect();
    assert_eq!(names, [None, Some("up-for-down")]);
    Ok(())
}

#[test]
fn test_named_dependency_materials_resolve() -> anyhow::Result<()> {
    //  third <- second
    //    |     /
    //    last
    let mut u = ScheduleFixture::new();
    let repo = in_folder(svn("svn"), "folder1");
    u.checkin_in_order(&repo, &["s1"]);

    let second = u.save_config_with("second", [repo.clone()]);
    let third = u.save_config_with("third", [named_dep(&second, "two")]);
    let last = [named_dep(&third, "three"), named_dep(&second, "two_2")];
    u.save_config_with("last", last.clone());

    let second_1 = u.run_and_pass(&second, &["s1"])?;
    let third_1 = u.run_and_pass(&third, &[&second_1])?;

    let given = u.mrs(&[(&last[0], &third_1), (&last[1], &second_1)])?;
    assert_eq!(u.resolve("last", &given)?, given);
    Ok(())
}

#[test]
fn test_same_material_in_different_folders_is_one_material() -> anyhow::Result<()> {
    //  second <- svn
    //    |      /
    //    third
    let mut u = ScheduleFixture::new();
    let one = in_folder(svn("svn"), "one");
    let two = in_folder(svn("svn"), "two");
    u.checkin_in_order(&one, &["s1"]);

    let second = u.save_config_with("second", [one.clone()]);
    u.save_config_with("third", [dep(&second), two.clone()]);
    let second_1 = u.run_and_pass(&second, &["s1"])?;

    let given = u.mrs(&[(&dep(&second), &second_1), (&two, "s1")])?;
    assert_eq!(u.resolve("third", &given)?, given);
    Ok(())
}

#[test]
fn test_upstream_with_modifications_for_different_stages() -> anyhow::Result<()> {
    //    /-->p1------\    p2(s1) --> p4
    //  git           p3
    //    \-->p2(s2)--/
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "f");
    let p1 = u.save_config_with("p1", [repo.clone()]);
    let p2 = u.save_config_with_stages("p2", &["s1", "s2"], [repo.clone()]);
    let on_s2 = dep_on("p2", "s2");
    u.save_config_with("p3", [on_s2.clone(), dep(&p1)]);
    u.save_config_with("p4", [dep_on("p2", "s1")]);

    u.checkin_in_order(&repo, &["g1"]);
    let p1_1 = u.run_and_pass(&p1, &["g1"])?;
    u.run_and_pass(&p2, &["g1"])?;

    let given = u.mrs(&[(&on_s2, "p2/1/s2/1"), (&dep(&p1), &p1_1)])?;
    assert_eq!(u.resolve("p3", &given)?, given);
    Ok(())
}

#[test]
fn test_diamond_with_children_depending_on_different_stages() -> anyhow::Result<()> {
    //         +---> p3 ---+
    //         |           v
    //  git -> p2          p5
    //         |           ^
    //         +--> p4 ----+
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "f");
    u.checkin_in_order(&repo, &["g1"]);

    let p2 = u.save_config_with_stages("p2", &["s1", "s2"], [repo.clone()]);
    let p3 = u.save_config_with("p3", [dep_on("p2", "s1")]);
    let p4 = u.save_config_with("p4", [dep_on("p2", "s2")]);
    u.save_config_with("p5", [dep(&p3), dep(&p4)]);

    let p2_s1_1 = u.run_and_pass(&p2, &["g1"])?;
    let p3_1 = u.run_and_pass(&p3, &[&p2_s1_1])?;
    let p4_1 = u.run_and_pass(&p4, &["p2/1/s2/1"])?;

    let given = u.mrs(&[(&dep(&p3), &p3_1), (&dep(&p4), &p4_1)])?;
    assert_eq!(u.resolve("p5", &given)?, given);
    Ok(())
}

#[test]
fn test_material_removed_and_put_back() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let git1 = in_folder(git("git1-url"), "git-folder1");
    let git2 = in_folder(git("git2-url"), "git-folder2");
    let git3 = in_folder(git("git3-url"), "git-folder3");

    let p1 = u.save_config_with("P1", [git1.clone(), git2.clone()]);
    let p2 = u.save_config_with("P2", [git2.clone()]);
    let p3 = u.save_config_with("P3", [dep(&p1), dep(&p2), git1.clone()]);
    let p4 = u.save_config_with("P4", [dep(&p3), git2.clone()]);

    u.checkin_in_order(&git1, &["git1_1"]);
    u.checkin_in_order(&git2, &["git2_1"]);
    let p1_1 = u.run_and_pass(&p1, &["git1_1", "git2_1"])?;
    let p2_1 = u.run_and_pass(&p2, &["git2_1"])?;
    let p3_1 = u.run_and_pass(&p3, &[&p1_1, &p2_1, "git1_1"])?;
    u.run_and_pass(&p4, &[&p3_1, "git2_1"])?;

    u.checkin_in_order(&git1, &["git1_2"]);
    u.checkin_in_order(&git2, &["git2_2"]);
    let p1_2 = u.run_and_pass(&p1, &["git1_2", "git2_2"])?;
    let p2_2 = u.run_and_pass(&p2, &["git2_2"])?;
    let p3_2 = u.run_and_pass(&p3, &[&p1_2, &p2_2, "git1_2"])?;
    u.run_and_pass(&p4, &[&p3_2, "git2_2"])?;

    // P2 switches from git2 to git3.
    let p2 = u.save_config_with("P2", [git3.clone()]);
    u.checkin_in_order(&git1, &["git1_3"]);
    u.checkin_in_order(&git2, &["git2_3"]);
    u.checkin_in_order(&git3, &["git3_1"]);
    let p1_3 = u.run_and_pass(&p1, &["git1_3", "git2_3"])?;
    let p2_3 = u.run_and_pass(&p2, &["git3_1"])?;
    let p3_3 = u.run_and_pass(&p3, &[&p1_3, &p2_3, "git1_3"])?;

    let given = u.mrs(&[(&dep(&p3), &p3_3), (&git2, "git2_3")])?;
    assert_eq!(latest_revisions(&u.resolve("P4", &given)?), latest_revisions(&given));

    // And back to git2.
    u.save_config_with("P2", [git2.clone()]);
    assert_eq!(latest_revisions(&u.resolve("P4", &given)?), latest_revisions(&given));
    Ok(())
}

#[test]
fn test_passed_stage_without_modifications_fails() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git1-url"), "git-folder1");
    let p1 = u.save_config_with("P1", [repo.clone()]);
    let p2 = u.save_config_with("P2", [repo.clone()]);
    let p3 = u.save_config_with("P3", [dep(&p1), dep(&p2)]);
    u.checkin_in_order(&repo, &["g1", "g2"]);

    let p1_1 = u.run_and_pass(&p1, &["g1"])?;
    let p2_1 = u.run_and_pass(&p2, &["g1"])?;
    u.run_and_pass(&p3, &[&p1_1, &p2_1])?;
    let p1_2 = u.run_and_pass(&p1, &["g2"])?;
    let p2_2 = u.run_and_pass(&p2, &["g2"])?;
    u.drop_stage_modifications(&p2_2)?;

    let given = u.mrs(&[(&dep(&p1), &p1_2), (&dep(&p2), &p2_1)])?;
    let err = u.resolve("P3", &given).unwrap_err();

    assert!(matches!(
        err,
        FaninError::NoModificationsPresentForDependentMaterial { .. }
    ));
    assert!(err.to_string().contains(&p2_2), "{err}");
    Ok(())
}

#[test]
fn test_no_passed_build_of_root_node() -> anyhow::Result<()> {
    //  git -------+
    //   |         |
    //   v         v
    //   P1 -----> P2
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "folder1");
    u.checkin_in_order(&repo, &["g1"]);
    let p1 = u.save_config_with("P1", [repo.clone()]);
    let p2 = u.save_config_with("P2", [dep(&p1), repo.clone()]);

    let p1_1 = u.run_and_pass(&p1, &["g1"])?;
    let config = FaninConfig::default().with_max_back_track_limit(2);
    for _ in 0..=config.max_back_track_limit {
        u.run_and_fail(&p2, &[&p1_1, "g1"])?;
    }

    let given = u.mrs(&[(&dep(&p1), &p1_1), (&repo, "g1")])?;
    assert_eq!(u.resolve_with("P2", &given, &config)?, given);
    Ok(())
}

#[test]
fn test_modified_stage_definition_of_root_node() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git"), "folder1");
    u.checkin_in_order(&repo, &["g1", "g2"]);
    let p1 = u.save_config_with("P1", [repo.clone()]);
    let p2 = u.save_config_with("P2", [dep(&p1), repo.clone()]);

    let p1_1 = u.run_and_pass(&p1, &["g1"])?;
    let config = FaninConfig::default().with_max_back_track_limit(2);
    for _ in 0..=config.max_back_track_limit {
        u.run_and_pass(&p2, &[&p1_1, "g1"])?;
    }
    let p1_2 = u.run_and_pass(&p1, &["g2"])?;
    u.change_stage_name("P2", "s", "new-stage")?;

    let given = u.mrs(&[(&dep(&p1), &p1_2), (&repo, "g2")])?;
    assert_eq!(u.resolve_with("P2", &given, &config)?, given);
    Ok(())
}

#[test]
fn test_failed_build_of_root_node_counts_as_previous_run() -> anyhow::Result<()> {
    //   +---> p1 ---+
    //   |           v
    //  git-------> p2
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git1"), "folder");
    u.checkin_in_order(&repo, &["g11", "g12", "g13"]);
    let p1 = u.save_config_with("p1", [repo.clone()]);
    let p2 = u.save_config_with("p2", [repo.clone(), dep(&p1)]);

    let p1_1 = u.run_and_pass(&p1, &["g11"])?;
    u.run_and_pass(&p2, &["g11", &p1_1])?;
    let p1_2 = u.run_and_pass(&p1, &["g12"])?;
    u.run_and_fail(&p2, &["g12", &p1_2])?;
    let p1_3 = u.run_and_pass(&p1, &["g13"])?;

    let given = u.mrs(&[(&repo, "g13"), (&dep(&p1), &p1_3)])?;
    assert_eq!(u.resolve("p2", &given)?, given);
    Ok(())
}

#[test]
fn test_modified_material_definition_of_root_node() -> anyhow::Result<()> {
    //   +---> p1 ---+
    //   |           v
    //  git-------> p2 <---- hg
    let mut u = ScheduleFixture::new();
    let repo = in_folder(git("git1"), "folder");
    let extra = in_folder(hg("hg"), "folder1");
    u.checkin_in_order(&repo, &["g11"]);
    u.checkin_in_order(&extra, &["h11"]);
    let p1 = u.save_config_with("p1", [repo.clone()]);
    let p2 = u.save_config_with("p2", [repo.clone(), dep(&p1)]);

    let p1_1 = u.run_and_pass(&p1, &["g11"])?;
    u.run_and_pass(&p2, &["g11", &p1_1])?;
    u.add_material_to_pipeline("p2", extra.clone())?;

    let given = u.mrs(&[(&repo, "g11"), (&dep(&p1), &p1_1), (&extra, "h11")])?;
    assert_eq!(u.resolve("p2", &given)?, given);
    Ok(())
}

#[test]
fn test_triangle_with_package_material() -> anyhow::Result<()> {
    //   +---> p1 ---+
    //   |           v
    //  pkg1-------> p2
    let mut u = ScheduleFixture::new();
    let pkg = package("repo/pkg1");
    u.checkin_in_order(&pkg, &["pkg1-1", "pkg1-2"]);
    let p1 = u.save_config_with("p1", [pkg.clone()]);
    let p2 = u.save_config_with("p2", [pkg.clone(), dep(&p1)]);

    let p1_1 = u.run_and_pass(&p1, &["pkg1-1"])?;
    u.run_and_pass(&p2, &["pkg1-1", &p1_1])?;

    let given = u.mrs(&[(&pkg, "pkg1-2"), (&dep(&p1), &p1_1)])?;
    let expected = u.mrs(&[(&pkg, "pkg1-1"), (&dep(&p1), &p1_1)])?;
    assert_eq!(u.resolve("p2", &given)?, expected);
    Ok(())
}

#[test]
fn test_diamond_with_package_and_plugin_materials() -> anyhow::Result<()> {
    //   +---> p1 ---+
    //   |           v
    //  src          p3
    //   |           ^
    //   +--> p2 ----+
    for source in [package("repo/pkg1"), plugin("scm1")] {
        let mut u = ScheduleFixture::new();
        u.checkin_in_order(&source, &["rev-1", "rev-2"]);
        let p1 = u.save_config_with("p1", [source.clone()]);
        let p2 = u.save_config_with("p2", [source.clone()]);
        u.save_config_with("p3", [dep(&p1), dep(&p2)]);

        let p1_1 = u.run_and_pass(&p1, &["rev-1"])?;
        let p2_1 = u.run_and_pass(&p2, &["rev-1"])?;
        let p2_2 = u.run_and_pass(&p2, &["rev-2"])?;

        let given = u.mrs(&[(&dep(&p1), &p1_1), (&dep(&p2), &p2_2)])?;
        let expected = u.mrs(&[(&dep(&p1), &p1_1), (&dep(&p2), &p2_1)])?;
        assert_eq!(u.resolve("p3", &given)?, expected, "{source}");
    }
    Ok(())
}

#[test]
fn test_backtrack_limit_stops_the_search() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = git("repoA");
    u.checkin_in_order(&repo, &["rev1", "rev2"]);
    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [dep(&a)]);
    let c = u.save_config_with("C", [dep(&a)]);
    u.save_config_with("D", [dep(&b), dep(&c)]);

    let a_1 = u.run_and_pass(&a, &["rev1"])?;
    let a_2 = u.run_and_pass(&a, &["rev2"])?;
    u.run_and_pass(&b, &[&a_1])?;
    let b_2 = u.run_and_pass(&b, &[&a_2])?;
    let c_1 = u.run_and_pass(&c, &[&a_1])?;
    let given = u.mrs(&[(&dep(&b), &b_2), (&dep(&c), &c_1)])?;

    let config = FaninConfig::default()
        .with_max_back_track_limit(1)
        .with_revision_batch_size(1);
    let err = u.resolve_with("D", &given, &config).unwrap_err();
    assert!(matches!(
        err,
        FaninError::MaxBackTrackLimitReached { limit: 1, .. }
    ));

    let config = config.with_max_back_track_limit(2);
    assert!(u.resolve_with("D", &given, &config).is_ok());
    Ok(())
}

#[test]
fn test_zero_scan_limits_are_rejected_before_resolving() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = git("repoA");
    u.checkin_in_order(&repo, &["rev1"]);
    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [dep(&a)]);
    let c = u.save_config_with("C", [dep(&a)]);
    u.save_config_with("D", [dep(&b), dep(&c)]);

    let a_1 = u.run_and_pass(&a, &["rev1"])?;
    let b_1 = u.run_and_pass(&b, &[&a_1])?;
    let c_1 = u.run_and_pass(&c, &[&a_1])?;
    let given = u.mrs(&[(&dep(&b), &b_1), (&dep(&c), &c_1)])?;

    let zero_batch = FaninConfig::default().with_revision_batch_size(0);
    let err = u.resolve_with("D", &given, &zero_batch).unwrap_err();
    assert!(matches!(err, FaninError::InvalidConfig(_)), "unexpected error: {err}");

    let zero_limit = FaninConfig::default().with_max_back_track_limit(0);
    let err = u.resolve_with("D", &given, &zero_limit).unwrap_err();
    assert!(matches!(err, FaninError::InvalidConfig(_)), "unexpected error: {err}");
    Ok(())
}

#[test]
fn test_reporting_reconciles_without_build_cause() -> anyhow::Result<()> {
    let mut u = ScheduleFixture::new();
    let repo = git("repoA");
    u.checkin_in_order(&repo, &["rev1", "rev2"]);
    let a = u.save_config_with("A", [repo.clone()]);
    let b = u.save_config_with("B", [dep(&a)]);
    let c = u.save_config_with("C", [dep(&a)]);
    u.save_config_with("D", [dep(&b), dep(&c), repo.clone()]);

    let a_1 = u.run_and_pass(&a, &["rev1"])?;
    let a_2 = u.run_and_pass(&a, &["rev2"])?;
    let b_1 = u.run_and_pass(&b, &[&a_1])?;
    u.run_and_pass(&b, &[&a_2])?;
    let c_1 = u.run_and_pass(&c, &[&a_1])?;

    let reported = u.report("D")?.expect("D has upstream dependencies");
    assert_eq!(latest_revisions(&reported), [b_1, c_1, "rev2".to_string()]);
    Ok(())
}
