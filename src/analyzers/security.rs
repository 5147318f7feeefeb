//! Security analyzer - unsafe calls, sensitive identifiers and protective patterns.
//!
//! All signals are heuristics over call names, assignment targets and source
//! lines. Nothing is resolved semantically.
//!
//! Per file the analyzer collects [`SecuritySignals`]; signals merge by
//! concatenation, sums and set unions, and the security score is always
//! computed from the merged signals.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::Severity;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::parser::start_line;
use crate::parser::visitor::{walk, Descend, Visitor};
use crate::parser::NodeKind;

/// Security analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FileSecurity;

    fn name(&self) -> &'static str {
        "security"
    }

    fn description(&self) -> &'static str {
        "Detect unsafe calls, exposed secrets and protective security patterns"
    }

    fn analyze(&self, unit: &SourceUnit, _ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit))
    }
}

/// Vulnerability categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityKind {
    SqlInjection,
    CommandInjection,
    CodeInjection,
    Xss,
    PathTraversal,
    InsecureDeserialization,
}

impl VulnerabilityKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::SqlInjection => "Potential SQL injection vulnerability",
            Self::CommandInjection => "Possible command injection vulnerability",
            Self::CodeInjection => "Dynamic code evaluation",
            Self::Xss => "Cross-site scripting sink",
            Self::PathTraversal => "Path traversal marker",
            Self::InsecureDeserialization => "Insecure deserialization",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::SqlInjection => "Use parameterized queries or an ORM",
            Self::CommandInjection => "Use subprocess.run with a list of arguments and shell=False",
            Self::CodeInjection => "Avoid eval/exec; use ast.literal_eval for literals",
            Self::Xss => "Escape output and set a content security policy",
            Self::PathTraversal => "Normalize paths and validate them against an allowed root",
            Self::InsecureDeserialization => "Use json or yaml.safe_load for untrusted data",
        }
    }
}

/// Pattern table: first matching row wins for a call.
fn vulnerability_table() -> &'static [(VulnerabilityKind, Regex, Severity, &'static str)] {
    static TABLE: OnceLock<Vec<(VulnerabilityKind, Regex, Severity, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            (
                VulnerabilityKind::SqlInjection,
                r"execute\s*\(|cursor\.execute|raw_input|input\s*\(.*\bquery\b",
                Severity::High,
                "CWE-89",
            ),
            (
                VulnerabilityKind::CommandInjection,
                r"os\.system|os\.popen|subprocess\.call",
                Severity::Critical,
                "CWE-78",
            ),
            (
                VulnerabilityKind::CodeInjection,
                r"\beval\(|\bexec\(",
                Severity::Critical,
                "CWE-94",
            ),
            (
                VulnerabilityKind::Xss,
                r"innerHTML|outerHTML|document\.write",
                Severity::High,
                "CWE-79",
            ),
            (
                VulnerabilityKind::PathTraversal,
                r"\.\./|\.\.\\|%2e%2e%2f",
                Severity::High,
                "CWE-22",
            ),
            (
                VulnerabilityKind::InsecureDeserialization,
                r"pickle\.loads?|yaml\.load\b|marshal\.loads",
                Severity::High,
                "CWE-502",
            ),
        ]
        .into_iter()
        .filter_map(|(kind, pattern, severity, cwe)| {
            Regex::new(pattern).ok().map(|re| (kind, re, severity, cwe))
        })
        .collect()
    })
}

fn compile(patterns: &[(&'static str, &str)]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (*name, re)))
        .collect()
}

fn sensitive_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            ("password", r"(?i)password|passwd|pwd"),
            ("api_key", r"(?i)api[_-]?key|token|secret"),
            ("credentials", r"(?i)credential|auth[_-]?token"),
            ("private_key", r"(?i)private[_-]?key|secret[_-]?key"),
            ("social_security", r"(?i)ssn|social[_-]?security"),
            ("credit_card", r"(?i)credit[_-]?card|card[_-]?number"),
        ])
    })
}

fn protection_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            ("validation", r"(?i)validate|clean|sanitize|escape"),
            ("sanitization", r"(?i)html\.escape|sanitize|bleach"),
            ("encryption", r"(?i)encrypt|hash|digest"),
            ("secure_headers", r"(?i)set_secure_headers|csp|hsts"),
            ("csrf", r"(?i)csrf|xsrf|token"),
        ])
    })
}

fn auth_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            ("basic_auth", r"(?i)basic_auth|authenticate"),
            ("token_auth", r"(?i)token_auth|jwt|bearer"),
            ("oauth", r"(?i)oauth|oidc"),
            ("session", r"(?i)session|cookie"),
            ("mfa", r"(?i)mfa|two_factor|2fa"),
        ])
    })
}

const AUTH_METHOD_COUNT: f64 = 5.0;

fn crypto_patterns() -> &'static [(&'static str, bool, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, bool, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            ("aes", true, r"(?i)\baes\b"),
            ("rsa", true, r"(?i)\brsa\b"),
            ("bcrypt", true, r"(?i)bcrypt"),
            ("pbkdf2", true, r"(?i)pbkdf2"),
            ("argon2", true, r"(?i)argon2"),
            ("md5", false, r"(?i)md5"),
            ("sha1", false, r"(?i)sha1\b"),
            ("des", false, r"(?i)\bdes\b"),
            ("blowfish", false, r"(?i)blowfish"),
        ]
        .into_iter()
        .filter_map(|(name, strong, pattern)| Regex::new(pattern).ok().map(|re| (name, strong, re)))
        .collect()
    })
}

const INPUT_SOURCES: &[&str] = &["input", "request", "get", "post"];
const VALIDATORS: &[&str] = &["isinstance", "validate", "clean"];
const VALIDATOR_KINDS: f64 = 5.0;

/// One potentially unsafe call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub kind: VulnerabilityKind,
    pub severity: Severity,
    pub description: String,
    pub file: String,
    pub line: u32,
    /// Trimmed source line.
    pub snippet: String,
    pub recommendation: String,
    /// CWE identifier.
    pub cwe: Option<String>,
}

impl Vulnerability {
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// An assignment whose target looks like a credential or PII.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveExposure {
    /// Category of the first matching sensitive-name pattern.
    pub category: String,
    pub name: String,
    pub file: String,
    pub line: u32,
}

/// Calls matching each protective-pattern family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectionCounts {
    pub validation: usize,
    pub sanitization: usize,
    pub encryption: usize,
    pub secure_headers: usize,
    pub csrf: usize,
}

impl ProtectionCounts {
    /// Per-family confidence, each capped at 1.
    pub fn confidences(&self) -> [(&'static str, f64); 5] {
        let cap = |count: usize, max: f64| (count as f64 / max).min(1.0);
        [
            ("validation", cap(self.validation, 5.0)),
            ("sanitization", cap(self.sanitization, 5.0)),
            ("encryption", cap(self.encryption, 5.0)),
            ("secure_headers", cap(self.secure_headers, 3.0)),
            ("csrf", cap(self.csrf, 2.0)),
        ]
    }

    /// Mean of the capped confidences.
    pub fn score(&self) -> f64 {
        self.confidences().iter().map(|(_, c)| c).sum::<f64>() / 5.0
    }

    fn bump(&mut self, family: &str) {
        match family {
            "validation" => self.validation += 1,
            "sanitization" => self.sanitization += 1,
            "encryption" => self.encryption += 1,
            "secure_headers" => self.secure_headers += 1,
            "csrf" => self.csrf += 1,
            _ => {}
        }
    }

    fn count(&self, family: &str) -> usize {
        match family {
            "validation" => self.validation,
            "sanitization" => self.sanitization,
            "encryption" => self.encryption,
            "secure_headers" => self.secure_headers,
            "csrf" => self.csrf,
            _ => 0,
        }
    }

    fn merge(&mut self, other: &ProtectionCounts) {
        self.validation += other.validation;
        self.sanitization += other.sanitization;
        self.encryption += other.encryption;
        self.secure_headers += other.secure_headers;
        self.csrf += other.csrf;
    }
}

/// Raw security signals of one file or a whole project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySignals {
    pub vulnerabilities: Vec<Vulnerability>,
    pub exposures: Vec<SensitiveExposure>,
    pub protection: ProtectionCounts,
    /// Calls to input sources (`input`, `request`, `get`, `post`).
    pub input_points: usize,
    /// Calls to validators (`isinstance`, `validate`, `clean`).
    pub validation_calls: usize,
    pub validation_types: BTreeSet<String>,
    pub auth_methods: BTreeSet<String>,
    pub crypto_strong: BTreeSet<String>,
    pub crypto_weak: BTreeSet<String>,
}

impl SecuritySignals {
    /// Fold another set of signals into this one.
    pub fn merge(&mut self, other: &SecuritySignals) {
        self.vulnerabilities.extend(other.vulnerabilities.iter().cloned());
        self.exposures.extend(other.exposures.iter().cloned());
        self.protection.merge(&other.protection);
        self.input_points += other.input_points;
        self.validation_calls += other.validation_calls;
        self.validation_types.extend(other.validation_types.iter().cloned());
        self.auth_methods.extend(other.auth_methods.iter().cloned());
        self.crypto_strong.extend(other.crypto_strong.iter().cloned());
        self.crypto_weak.extend(other.crypto_weak.iter().cloned());
    }

    /// Validation calls per input point (capped at 1) times validator variety.
    pub fn input_validation_score(&self) -> f64 {
        let coverage = (self.validation_calls as f64 / self.input_points.max(1) as f64).min(1.0);
        let strength = (self.validation_types.len() as f64 / VALIDATOR_KINDS).min(1.0);
        coverage * strength
    }

    pub fn authentication_strength(&self) -> f64 {
        (self.auth_methods.len() as f64 / AUTH_METHOD_COUNT).min(1.0)
    }

    /// Share of strong algorithms among those referenced; 0 when none are.
    pub fn crypto_strength(&self) -> f64 {
        let total = self.crypto_strong.len() + self.crypto_weak.len();
        if total == 0 {
            0.0
        } else {
            self.crypto_strong.len() as f64 / total as f64
        }
    }

    /// Weighted security score in `[0, 100]`.
    pub fn score(&self) -> f64 {
        let vulnerabilities = 1.0 - (self.vulnerabilities.len() as f64 / 10.0).min(1.0);
        let exposures = 1.0 - (self.exposures.len() as f64 / 5.0).min(1.0);
        let score = vulnerabilities * 0.3
            + exposures * 0.2
            + self.protection.score() * 0.15
            + self.input_validation_score() * 0.15
            + self.authentication_strength() * 0.1
            + self.crypto_strength() * 0.1;
        (score * 100.0).clamp(0.0, 100.0)
    }

    pub fn severity_distribution(&self) -> SeverityDistribution {
        let mut distribution = SeverityDistribution::default();
        for vuln in &self.vulnerabilities {
            match vuln.severity {
                Severity::Low => distribution.low += 1,
                Severity::Medium => distribution.medium += 1,
                Severity::High => distribution.high += 1,
                Severity::Critical => distribution.critical += 1,
            }
        }
        distribution
    }
}

/// Vulnerability counts per severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

/// Per-file security result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSecurity {
    pub path: String,
    pub skipped: bool,
    #[serde(flatten)]
    pub signals: SecuritySignals,
    pub security_score: f64,
}

/// A protective pattern family present in the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPattern {
    pub name: String,
    /// Capped confidence in `[0, 1]`.
    pub confidence: f64,
    /// Files with at least one matching call.
    pub locations: Vec<String>,
    pub description: String,
}

/// Project-level security metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityMetrics {
    #[serde(flatten)]
    pub signals: SecuritySignals,
    pub severity_distribution: SeverityDistribution,
    pub security_patterns: Vec<SecurityPattern>,
    pub mfa_enabled: bool,
    pub security_score: f64,
    pub total_files: usize,
}

impl SecurityMetrics {
    pub fn has_critical(&self) -> bool {
        self.severity_distribution.critical > 0
    }
}

/// Analyze one unit.
pub fn analyze_unit(unit: &SourceUnit) -> FileSecurity {
    let Some(root) = unit.root() else {
        return FileSecurity {
            path: unit.display_path(),
            skipped: true,
            security_score: 0.0,
            ..Default::default()
        };
    };

    let mut visitor = SecurityVisitor {
        unit,
        file: unit.display_path(),
        signals: SecuritySignals::default(),
        reported: HashSet::new(),
    };
    walk(root, &mut visitor);
    let mut signals = visitor.signals;

    for line in unit.source.lines() {
        for (name, strong, re) in crypto_patterns() {
            if re.is_match(line) {
                let set = if *strong {
                    &mut signals.crypto_strong
                } else {
                    &mut signals.crypto_weak
                };
                set.insert(name.to_string());
            }
        }
    }

    FileSecurity {
        path: unit.display_path(),
        skipped: false,
        security_score: signals.score(),
        signals,
    }
}

struct SecurityVisitor<'u> {
    unit: &'u SourceUnit,
    file: String,
    signals: SecuritySignals,
    /// (line, kind) pairs already reported, so calls sharing a line count once.
    reported: HashSet<(u32, VulnerabilityKind)>,
}

impl SecurityVisitor<'_> {
    fn visit_call(&mut self, call: Node<'_>) {
        let callee_node = call.child_by_field_name("function");
        let callee = callee_node.map(|n| self.unit.text(&n)).unwrap_or("");
        let line = start_line(&call);
        let source_line = self.unit.line(line);

        if let Some((kind, _, severity, cwe)) = vulnerability_table()
            .iter()
            .find(|(_, re, _, _)| re.is_match(callee) || re.is_match(source_line))
        {
            if self.reported.insert((line, *kind)) {
                self.signals.vulnerabilities.push(Vulnerability {
                    kind: *kind,
                    severity: *severity,
                    description: format!("{}: {}", kind.description(), callee),
                    file: self.file.clone(),
                    line,
                    snippet: source_line.trim().to_string(),
                    recommendation: kind.recommendation().to_string(),
                    cwe: Some(cwe.to_string()),
                });
            }
        }

        if !callee.is_empty() {
            for (family, re) in protection_patterns() {
                if re.is_match(callee) {
                    self.signals.protection.bump(family);
                }
            }
            for (method, re) in auth_patterns() {
                if re.is_match(callee) {
                    self.signals.auth_methods.insert(method.to_string());
                }
            }
        }

        if callee_node.is_some_and(|n| n.kind() == "identifier") {
            if INPUT_SOURCES.contains(&callee) {
                self.signals.input_points += 1;
            }
            if VALIDATORS.contains(&callee) {
                self.signals.validation_calls += 1;
                self.signals.validation_types.insert(callee.to_string());
            }
        }
    }

    fn visit_assignment(&mut self, assign: Node<'_>) {
        let Some(left) = assign.child_by_field_name("left") else {
            return;
        };
        let targets: Vec<Node<'_>> = match left.kind() {
            "identifier" => vec![left],
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = left.walk();
                left.named_children(&mut cursor)
                    .filter(|c| c.kind() == "identifier")
                    .collect()
            }
            _ => Vec::new(),
        };

        for target in targets {
            let name = self.unit.text(&target);
            if let Some((category, _)) = sensitive_patterns().iter().find(|(_, re)| re.is_match(name)) {
                self.signals.exposures.push(SensitiveExposure {
                    category: category.to_string(),
                    name: name.to_string(),
                    file: self.file.clone(),
                    line: start_line(&target),
                });
            }
        }
    }
}

impl<'t> Visitor<'t> for SecurityVisitor<'_> {
    fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
        match kind {
            NodeKind::Call => self.visit_call(node),
            NodeKind::Assignment => self.visit_assignment(node),
            _ => {}
        }
        Descend::Continue
    }
}

/// Combine per-file results into project metrics.
pub fn summarize(files: &[FileSecurity]) -> SecurityMetrics {
    let analyzed: Vec<&FileSecurity> = files.iter().filter(|f| !f.skipped).collect();
    if analyzed.is_empty() {
        return SecurityMetrics::default();
    }

    let mut signals = SecuritySignals::default();
    let mut locations: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for file in &analyzed {
        signals.merge(&file.signals);
        for (family, _) in file.signals.protection.confidences() {
            if file.signals.protection.count(family) > 0 {
                locations.entry(family).or_default().push(file.path.clone());
            }
        }
    }
    signals.vulnerabilities.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });

    let security_patterns = signals
        .protection
        .confidences()
        .into_iter()
        .filter_map(|(family, confidence)| {
            let files = locations.remove(family)?;
            Some(SecurityPattern {
                name: family.to_string(),
                confidence,
                locations: files,
                description: format!("{} calls detected", signals.protection.count(family)),
            })
        })
        .collect();

    SecurityMetrics {
        severity_distribution: signals.severity_distribution(),
        security_patterns,
        mfa_enabled: signals.auth_methods.contains("mfa"),
        security_score: signals.score(),
        total_files: analyzed.len(),
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(code: &str) -> FileSecurity {
        analyze_unit(&SourceUnit::parse("sec.py", code, &Parser::new()))
    }

    #[test]
    fn test_os_system_is_one_critical_vulnerability() {
        let result = analyze("import os\nos.system('ls')\n");
        let vulns = &result.signals.vulnerabilities;
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].kind, VulnerabilityKind::CommandInjection);
        assert_eq!(vulns[0].severity, Severity::Critical);
        assert_eq!(vulns[0].cwe.as_deref(), Some("CWE-78"));
        assert_eq!(vulns[0].line, 2);
        assert!(vulns[0].description.contains("os.system"));
        assert_eq!(vulns[0].location(), "sec.py:2");
    }

    #[test]
    fn test_clean_function_has_no_vulnerabilities() {
        let result = analyze("def f(): return 1\n");
        assert!(result.signals.vulnerabilities.is_empty());
        assert!(result.signals.exposures.is_empty());
    }

    #[test]
    fn test_one_finding_per_line_and_kind() {
        let result = analyze("import os\nos.system(cmd.strip())\n");
        assert_eq!(result.signals.vulnerabilities.len(), 1);
    }

    #[test]
    fn test_table_rows() {
        let code = "eval(data)\ncursor.execute(q)\npickle.loads(blob)\nopen('../etc/passwd')\n";
        let result = analyze(code);
        let kinds: Vec<_> = result.signals.vulnerabilities.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VulnerabilityKind::CodeInjection,
                VulnerabilityKind::SqlInjection,
                VulnerabilityKind::InsecureDeserialization,
                VulnerabilityKind::PathTraversal,
            ]
        );
    }

    #[test]
    fn test_sensitive_assignments() {
        let result = analyze("db_password = 'x'\napi_key, user = load()\ncount = 1\n");
        let names: Vec<_> = result.signals.exposures.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["db_password", "api_key"]);
        assert_eq!(result.signals.exposures[0].category, "password");
        assert_eq!(result.signals.exposures[1].category, "api_key");
    }

    #[test]
    fn test_protection_and_validation() {
        let code = "x = input()\nif isinstance(x, str):\n    validate(x)\nescaped = html.escape(x)\ndigest = hashlib.sha256(x).hexdigest()\n";
        let result = analyze(code);
        let signals = &result.signals;
        assert_eq!(signals.input_points, 1);
        assert_eq!(signals.validation_calls, 2);
        assert_eq!(signals.validation_types.len(), 2);
        assert_eq!(signals.protection.validation, 2);
        assert_eq!(signals.protection.sanitization, 1);
        assert!(signals.protection.encryption >= 1);
        assert!((signals.input_validation_score() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_authentication_and_crypto() {
        let code = "user = authenticate(req)\nsession_start(user)\nh = hashlib.md5(b'x')\nk = bcrypt.hashpw(p, s)\n";
        let result = analyze(code);
        let signals = &result.signals;
        assert!(signals.auth_methods.contains("basic_auth"));
        assert!(signals.auth_methods.contains("session"));
        assert!(signals.crypto_weak.contains("md5"));
        assert!(signals.crypto_strong.contains("bcrypt"));
        assert!((signals.crypto_strength() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds() {
        let clean = analyze("x = 1\n");
        assert!((clean.security_score - 50.0).abs() < 1e-9);

        let mut code = String::new();
        for i in 0..12 {
            code.push_str(&format!("eval(x{i})\n"));
        }
        for i in 0..6 {
            code.push_str(&format!("secret_{i} = 1\n"));
        }
        let bad = analyze(&code);
        assert!(bad.security_score >= 0.0);
        assert!(bad.security_score < clean.security_score);
    }

    #[test]
    fn test_skipped_file() {
        let result = analyze("def broken(:\n");
        assert!(result.skipped);
        assert!(result.signals.vulnerabilities.is_empty());
    }

    #[test]
    fn test_summarize_merges_files() {
        let a = analyze("import os\nos.system('ls')\nvalidate(x)\n");
        let b = analyze("eval(code)\npassword = 'p'\n");
        let metrics = summarize(&[a, b]);

        assert_eq!(metrics.total_files, 2);
        assert_eq!(metrics.signals.vulnerabilities.len(), 2);
        assert_eq!(metrics.severity_distribution.critical, 2);
        assert!(metrics.has_critical());
        assert_eq!(metrics.signals.exposures.len(), 1);
        assert_eq!(metrics.security_patterns.len(), 1);
        assert_eq!(metrics.security_patterns[0].name, "validation");
        assert_eq!(metrics.security_patterns[0].locations, vec!["sec.py".to_string()]);
        assert!((0.0..=100.0).contains(&metrics.security_score));
    }

    #[test]
    fn test_summarize_empty() {
        let metrics = summarize(&[]);
        assert_eq!(metrics.security_score, 0.0);
        assert!(!metrics.has_critical());
    }
}
