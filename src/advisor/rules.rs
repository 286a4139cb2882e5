use super::{ErrorRule, Severity};

fn rule(
    code: &str,
    severity: Severity,
    description: &str,
    causes: &[&str],
    remediation: &[&str],
) -> ErrorRule {
    ErrorRule {
        code: code.to_string(),
        description: description.to_string(),
        severity,
        causes: causes.iter().map(|s| s.to_string()).collect(),
        remediation: remediation.iter().map(|s| s.to_string()).collect(),
    }
}

/// Rules observed while moving solutions onto Directory.Packages.props.
/// Order within a tier is the tie-break used by `prioritize`.
pub fn default_rules() -> Vec<ErrorRule> {
    vec![
        rule(
            "NU1103",
            Severity::Blocking,
            "Unable to find package",
            &[
                "The pinned version only exists as a prerelease on the configured feeds",
                "The package was pulled from the internal feed or never mirrored",
                "packages.config referenced a version that restore cannot see",
            ],
            &[
                "Consider direct assembly references for problematic packages",
                "Pin a stable version that exists on the feed in Directory.Packages.props",
                "Check nuget.config package sources and feed credentials",
            ],
        ),
        rule(
            "NU1605",
            Severity::Blocking,
            "Detected package downgrade",
            &[
                "The central version is lower than a version required by a transitive dependency",
                "A project-level VersionOverride pins an older version",
            ],
            &[
                "Update package versions to resolve conflicts",
                "Raise the PackageVersion in Directory.Packages.props to the required version",
                "Remove stale VersionOverride attributes from project files",
            ],
        ),
        rule(
            "NU1202",
            Severity::Blocking,
            "Package not compatible with framework",
            &[
                "The central version dropped support for the project's target framework",
                "A .NET Framework project picked up a netstandard2.1 or net6.0+ only package",
            ],
            &[
                "Use framework-compatible package versions",
                "Add a VersionOverride for the affected project or split the PackageVersion with a TargetFramework condition",
            ],
        ),
        rule(
            "NU1010",
            Severity::Blocking,
            "Package reference without version",
            &[
                "A PackageReference has no matching PackageVersion entry",
                "The package name differs in case or spelling between project and props file",
            ],
            &[
                "Add missing PackageVersion entries to Directory.Packages.props",
                "Re-run package extraction across all project files before the next build",
            ],
        ),
        rule(
            "MSB4062",
            Severity::Build,
            "Duplicate assembly attributes",
            &[
                "SDK-style conversion generates AssemblyInfo while Properties/AssemblyInfo.cs still exists",
                "A build task assembly could not be loaded after the package layout changed",
            ],
            &[
                "Add <GenerateAssemblyInfo>false</GenerateAssemblyInfo> to projects",
                "Delete the legacy AssemblyInfo.cs if the generated attributes are sufficient",
            ],
        ),
        rule(
            "NU1506",
            Severity::Warning,
            "Duplicate package version",
            &[
                "The same package appears in more than one PackageVersion entry",
                "Imported props files declare overlapping PackageVersion items",
            ],
            &[
                "Remove duplicate PackageVersion entries",
                "Keep a single PackageVersion per package in Directory.Packages.props",
            ],
        ),
    ]
}
