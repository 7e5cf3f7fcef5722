use std::fs;

use tagpub_core::BuildIdentity;
use tagpub_render::{MavenSettingsContext, RepoConfigContext, TemplateEngine};
use tempfile::TempDir;

fn identity() -> BuildIdentity {
    BuildIdentity::new(
        "widget",
        "main",
        Some("42".into()),
        Some("https://ci.example/job/42".into()),
    )
    .expect("identity")
}

#[test]
fn yum_repo_descriptor_has_section_baseurl_and_install_hint() {
    let engine = TemplateEngine::embedded().expect("engine");
    let url = "http://files.example:7070/widget/main/42/repo";
    let out = engine
        .render_repo_config(&RepoConfigContext::new(&identity(), url))
        .expect("render");

    assert!(out.starts_with("[widget/main/42]\n"), "got:\n{out}");
    assert!(out.contains("name=widget/main/42\n"));
    assert!(out.contains(&format!("baseurl={url}\n")));
    assert!(out.contains("enabled=1\n"));
    assert!(out.contains("gpgcheck=0\n"));
    assert!(out.contains("skip_if_unavailable=1\n"));
    assert!(out.contains(&format!(
        "# curl {url}/config.txt -o /etc/yum.repos.d/widget.repo"
    )));
    assert!(out.contains("# https://ci.example/job/42"));
}

#[test]
fn developer_build_descriptor_uses_dev_segment() {
    let dev = BuildIdentity::new("widget", "main", None, None).expect("identity");
    let engine = TemplateEngine::embedded().expect("engine");
    let out = engine
        .render_repo_config(&RepoConfigContext::new(&dev, "http://files/widget/main/dev/repo"))
        .expect("render");
    assert!(out.starts_with("[widget/main/dev]"));
    assert!(out.contains("# (none)"));
}

#[test]
fn maven_settings_lists_every_repository_escaped() {
    let engine = TemplateEngine::embedded().expect("engine");
    let ctx = MavenSettingsContext::from_urls([
        "http://files.example/widget/main/41/maven-repository",
        "https://repo.example/maven?a=1&b=2",
    ]);
    let out = engine.render_maven_settings(&ctx).expect("render");

    assert!(out.contains(
        "<repository><id>repo-0</id><url>http://files.example/widget/main/41/maven-repository</url></repository>"
    ));
    assert!(out.contains("<id>repo-1</id><url>https://repo.example/maven?a=1&amp;b=2</url>"));
    assert!(out.contains("<activeProfile>main</activeProfile>"));
}

#[test]
fn user_template_overrides_embedded_default() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("yum")).expect("mkdir");
    fs::write(
        dir.path().join("yum").join("repo.tera"),
        "[custom {{ section }}]\nbaseurl={{ repository_url }}\n",
    )
    .expect("write");

    let engine = TemplateEngine::new(Some(dir.path())).expect("engine");
    let out = engine
        .render_repo_config(&RepoConfigContext::new(&identity(), "http://x/repo"))
        .expect("render");
    assert!(out.starts_with("[custom widget/main/42]\nbaseurl=http://x/repo"), "got:\n{out}");
    assert!(!out.contains("gpgcheck"));
}

#[test]
fn missing_user_template_dir_is_ignored() {
    let dir = TempDir::new().expect("tempdir");
    let engine = TemplateEngine::new(Some(&dir.path().join("absent"))).expect("engine");
    let ctx = MavenSettingsContext::from_urls(Vec::<String>::new());
    let out = engine.render_maven_settings(&ctx).expect("render");
    assert!(!out.contains("<repository>"));
}

#[test]
fn unrelated_files_in_template_dir_are_ignored() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("notes.tera"), "{% if unclosed %}").expect("write");
    fs::create_dir_all(dir.path().join("maven")).expect("mkdir");
    fs::write(
        dir.path().join("maven").join("settings.xml.tera"),
        "{% for r in repositories %}{{ r.url }};{% endfor %}",
    )
    .expect("write");

    let engine = TemplateEngine::new(Some(dir.path())).expect("engine");
    let ctx = MavenSettingsContext::from_urls(vec!["http://a", "http://b"]);
    assert_eq!(engine.render_maven_settings(&ctx).expect("render"), "http://a;http://b;");
    let repo = engine
        .render_repo_config(&RepoConfigContext::new(&identity(), "http://x/repo"))
        .expect("render");
    assert!(repo.contains("gpgcheck"), "embedded yum template kept:\n{repo}");
}
