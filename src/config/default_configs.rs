use indexmap::IndexMap;

use crate::config::artifact_config::ArtifactConfig;

/// Ordered name -> config table.
///
/// Order matters: when two configs resolve to the same manifest key, the one
/// listed first is uploaded.
pub type ArtifactTable = IndexMap<String, ArtifactConfig>;

/// Test suite zip uploaded unzipped, with its bundled JDK left out
fn suite_without_jdk(name: &str) -> ArtifactConfig {
    ArtifactConfig::new(format!("{}.zip", name), true)
        .with_exclude_filters([format!("{}/jdk/.*", name)])
}

fn unzipped(source_path: &str) -> ArtifactConfig {
    ArtifactConfig::new(source_path, true)
}

fn single_file(source_path: &str) -> ArtifactConfig {
    ArtifactConfig::new(source_path, false)
}

/// Artifacts uploaded on every run.
///
/// Override entries with the `--artifacts` flag, e.g.:
///   `--artifacts 'img=./*-img-*zip'` to only match at the top of the output dir
///   `--artifacts 'img=*-img-*zip standard=false'` to only upload chunked versions
///   `--artifacts 'new=./logs/*.json'` to add an entry
///   `--artifacts 'img='` to drop an entry
pub fn preset_artifacts() -> ArtifactTable {
    let entries: Vec<(&str, ArtifactConfig)> = vec![
        // test_suite targets
        ("android-catbox", suite_without_jdk("android-catbox")),
        ("android-csuite", suite_without_jdk("android-csuite")),
        ("android-cts", suite_without_jdk("android-cts")),
        ("android-gcatbox", suite_without_jdk("android-gcatbox")),
        ("android-gts", suite_without_jdk("android-gts")),
        ("android-mcts", unzipped("android-mcts.zip")),
        ("android-mts", suite_without_jdk("android-mts")),
        ("android-pts", suite_without_jdk("android-pts")),
        ("android-sts", unzipped("android-sts.zip")),
        ("android-tvts", suite_without_jdk("android-tvts")),
        ("android-vts", unzipped("android-vts.zip")),
        ("android-wts", suite_without_jdk("android-wts")),
        ("art-host-tests", unzipped("art-host-tests.zip")),
        ("bazel-test-suite", unzipped("bazel-test-suite.zip")),
        ("host-unit-tests", unzipped("host-unit-tests.zip")),
        ("general-tests", unzipped("general-tests.zip")),
        ("general-tests_configs", unzipped("general-tests_configs.zip")),
        ("general-tests_host-shared-libs", unzipped("general-tests_host-shared-libs.zip")),
        ("tradefed", unzipped("tradefed.zip")),
        ("google-tradefed", unzipped("google-tradefed.zip")),
        ("robolectric-tests", unzipped("robolectric-tests.zip")),
        ("ravenwood-tests", unzipped("ravenwood-tests.zip")),
        ("test_mappings", unzipped("test_mappings.zip")),
        // Mainline artifacts
        ("apex", single_file("*.apex")),
        ("apk", single_file("*.apk")),
        // Device target artifacts
        ("androidTest", unzipped("androidTest.zip")),
        ("device-tests", unzipped("device-tests.zip")),
        ("device-tests_configs", unzipped("device-tests_configs.zip")),
        ("device-tests_host-shared-libs", unzipped("device-tests_host-shared-libs.zip")),
        ("performance-tests", unzipped("performance-tests.zip")),
        ("device-platinum-tests", unzipped("device-platinum-tests.zip")),
        ("device-platinum-tests_configs", unzipped("device-platinum-tests_configs.zip")),
        (
            "device-platinum-tests_host-shared-libs",
            unzipped("device-platinum-tests_host-shared-libs.zip"),
        ),
        ("camera-hal-tests", unzipped("camera-hal-tests.zip")),
        ("camera-hal-tests_configs", unzipped("camera-hal-tests_configs.zip")),
        ("camera-hal-tests_host-shared-libs", unzipped("camera-hal-tests_host-shared-libs.zip")),
        ("device-pixel-tests", unzipped("device-pixel-tests.zip")),
        ("device-pixel-tests_configs", unzipped("device-pixel-tests_configs.zip")),
        ("device-pixel-tests_host-shared-libs", unzipped("device-pixel-tests_host-shared-libs.zip")),
        ("automotive-tests", unzipped("automotive-tests.zip")),
        ("automotive-general-tests", unzipped("automotive-general-tests")),
        ("automotive-sdv-tests", unzipped("automotive-sdv-tests")),
        ("automotive-sdv-tests_configs", unzipped("automotive-sdv-tests_configs")),
        ("tests", unzipped("*-tests-*zip")),
        ("continuous_instrumentation_tests", unzipped("*-continuous_instrumentation_tests-*zip")),
        (
            "continuous_instrumentation_metric_tests",
            unzipped("*-continuous_instrumentation_metric_tests-*zip"),
        ),
        ("continuous_native_tests", unzipped("*-continuous_native_tests-")),
        ("cvd-host_package", single_file("cvd-host_package.tar.gz")),
        ("bootloader", single_file("bootloader.img")),
        ("radio", single_file("radio.img")),
        ("target_files", unzipped("*-target_files-*")),
        (
            "img",
            unzipped("*-img-*zip")
                .with_standard(false)
                .with_chunk(true)
                .with_chunk_dir(true),
        ),
    ];

    entries
        .into_iter()
        .map(|(name, config)| (name.to_string(), config))
        .collect()
}

/// Artifacts uploaded only when named with `--experiment-artifacts`.
///
/// Used to try uploads on a subset of branches or targets before adding
/// them to the preset table.
pub fn experiment_artifacts() -> ArtifactTable {
    let mut table = ArtifactTable::new();
    table.insert(
        "device_image_proguard_dict".to_string(),
        single_file("*-proguard-dict-*.zip").with_chunk(true),
    );
    table
}
