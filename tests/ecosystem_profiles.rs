//! Profiles of small but realistic projects, one ecosystem per test.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use project_profiler::{
    analyze_blocking, AnalysisOptions, AnalysisResult, Confidence, Ecosystem, ProjectType, WorkspaceType,
};

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

fn profile(files: &[(&str, &str)]) -> AnalysisResult {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        write(dir.path(), path, content);
    }
    analyze_blocking(dir.path(), AnalysisOptions::default()).unwrap()
}

fn commands(result: &AnalysisResult) -> Vec<&str> {
    result.execution_methods.iter().map(|m| m.command.as_str()).collect()
}

fn framework_names(result: &AnalysisResult) -> Vec<&str> {
    result.frameworks.iter().map(|f| f.name.as_str()).collect()
}

const GO_MOD: &str = r#"module github.com/acme/api

go 1.22

require (
	github.com/gin-gonic/gin v1.9.1
)
"#;

const SPRING_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.acme</groupId>
  <artifactId>orders</artifactId>
  <version>0.0.1-SNAPSHOT</version>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-maven-plugin</artifactId>
      </plugin>
    </plugins>
  </build>
</project>
"#;

mod backends {
    use super::*;

    #[test]
    fn test_go_gin_service() {
        let result = profile(&[
            ("go.mod", GO_MOD),
            (
                "main.go",
                "package main\n\nimport \"github.com/gin-gonic/gin\"\n\nfunc main() {\n\tgin.Default().Run()\n}\n",
            ),
        ]);

        assert_eq!(result.languages.primary, "go");
        assert!(framework_names(&result).contains(&"gin"));
        assert_eq!(result.project_type, ProjectType::ApiService);
        assert_eq!(
            commands(&result),
            vec!["go run .", "go build ./...", "go test ./...", "go mod download"]
        );
        assert!(result
            .execution_methods
            .iter()
            .all(|m| m.ecosystem == Some(Ecosystem::Go)));
    }

    #[test]
    fn test_spring_boot_with_wrapper() {
        let result = profile(&[
            ("pom.xml", SPRING_POM),
            ("mvnw", "#!/bin/sh\n"),
            (
                "src/main/java/com/acme/OrdersApplication.java",
                "package com.acme;\n\n@SpringBootApplication\npublic class OrdersApplication {}\n",
            ),
        ]);

        assert_eq!(result.languages.primary, "java");
        let spring = result.frameworks.iter().find(|f| f.name == "spring-boot").unwrap();
        assert_eq!(spring.ecosystem, Ecosystem::Maven);
        assert_eq!(spring.confidence, Confidence::High);
        assert_eq!(result.project_type, ProjectType::ApiService);
        assert_eq!(result.execution_methods[0].command, "./mvnw spring-boot:run");
        assert!(commands(&result).contains(&"./mvnw test"));
    }

    #[test]
    fn test_rails_application() {
        let result = profile(&[
            (
                "Gemfile",
                "source \"https://rubygems.org\"\n\ngem \"rails\", \"~> 7.1\"\n\ngroup :test do\n  gem \"rspec-rails\"\nend\n",
            ),
            ("bin/rails", "#!/usr/bin/env ruby\n"),
            ("config/routes.rb", "Rails.application.routes.draw do\nend\n"),
            ("app/models/order.rb", "class Order < ApplicationRecord\nend\n"),
        ]);

        assert_eq!(result.languages.primary, "ruby");
        assert_eq!(result.project_type, ProjectType::WebApplication);
        assert_eq!(result.testing_frameworks, vec!["rspec"]);
        assert_eq!(
            commands(&result),
            vec!["bin/rails server", "bundle exec rspec", "bundle install"]
        );
    }
}

mod layouts {
    use super::*;

    #[test]
    fn test_yarn_workspace() {
        let result = profile(&[
            (
                "package.json",
                r#"{"name": "mono", "private": true, "workspaces": ["packages/*"],
                   "scripts": {"build": "tsc -b", "test": "jest"},
                   "devDependencies": {"jest": "^29.0.0"}}"#,
            ),
            ("yarn.lock", "# yarn lockfile v1\n"),
            ("packages/ui/package.json", r#"{"name": "@mono/ui", "dependencies": {"react": "^18.0.0"}}"#),
            ("packages/ui/src/Button.tsx", "export const Button = () => null;\n"),
            (
                "packages/app/package.json",
                r#"{"name": "@mono/app", "dependencies": {"@mono/ui": "*", "express": "^4.0.0"}}"#,
            ),
            ("packages/app/src/server.ts", "import express from 'express';\n"),
        ]);

        assert_eq!(result.workspace.workspace_type, WorkspaceType::NpmWorkspace);
        assert_eq!(result.workspace.module_names(), vec!["@mono/app", "@mono/ui"]);
        let app = result.workspace.get_module("@mono/app").unwrap();
        assert_eq!(app.internal_dependencies, vec!["@mono/ui"]);

        assert_eq!(result.execution_methods[0].command, "yarn run build");
        assert!(commands(&result).contains(&"yarn run test"));
        assert!(commands(&result).contains(&"yarn install"));
        assert!(result.testing_frameworks.contains(&"jest".to_string()));
    }

    #[test]
    fn test_makefile_c_project() {
        let result = profile(&[
            (
                "Makefile",
                "all: build\n\nbuild:\n\tcc -o app main.c\n\ntest: build\n\t./app --test\n\n.PHONY: all build test\n",
            ),
            ("main.c", "#include <stdio.h>\n\n/* entry */\nint main(void) {\n  return 0;\n}\n"),
        ]);

        assert_eq!(result.languages.primary, "c");
        assert_eq!(commands(&result), vec!["make all", "make build", "make test"]);
        assert!(result.execution_methods.iter().all(|m| m.ecosystem.is_none()));
        assert_eq!(result.entry_points, vec!["main.c"]);
        assert_eq!(result.metrics.comment_lines, 1);
        assert_eq!(result.metrics.blank_lines, 1);
        assert_eq!(result.metrics.code_lines, 4);
    }

    #[test]
    fn test_documentation_only() {
        let result = profile(&[("README.md", "# Notes\n"), ("docs/guide.md", "## Guide\n")]);
        assert_eq!(result.project_type, ProjectType::Documentation);
        assert!(result.quality.has_documentation);
        assert_eq!(result.quality.doc_file_count, 2);
    }
}

mod edge_cases {
    use super::*;

    fn profile_with(files: &[(&str, &str)], options: AnalysisOptions) -> AnalysisResult {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            write(dir.path(), path, content);
        }
        analyze_blocking(dir.path(), options).unwrap()
    }

    #[test]
    fn test_non_ascii_maven_coordinates() {
        let pom = r#"<project>
  <groupId>io.€€</groupId>
  <artifactId>kasse</artifactId>
  <dependencies>
    <dependency><groupId>io.€€</groupId><artifactId>x</artifactId></dependency>
    <dependency><groupId>io.ktor</groupId><artifactId>ktor-server-core</artifactId></dependency>
  </dependencies>
</project>
"#;
        let result = profile(&[("pom.xml", pom), ("src/main/kotlin/App.kt", "fun main() {}\n")]);

        let maven = result.manifests.iter().find(|m| m.ecosystem == Ecosystem::Maven).unwrap();
        assert!(maven.declared_dependencies.contains_key("io.€€:x"));
        assert!(framework_names(&result).contains(&"ktor"));
    }

    #[test]
    fn test_non_ascii_npm_names() {
        let result = profile(&[
            (
                "package.json",
                r#"{"name": "büro-app", "scripts": {"stárt": "node index.js"}, "dependencies": {"réact-ünï": "1.0.0", "express": "^4.0.0"}}"#,
            ),
            ("index.js", "console.log('grüß dich')\n"),
        ]);

        assert_eq!(result.manifests[0].name.as_deref(), Some("büro-app"));
        assert!(framework_names(&result).contains(&"express"));
        assert!(commands(&result).contains(&"npm run 'stárt'"));
    }

    #[test]
    fn test_member_directory_with_spaces() {
        let result = profile(&[
            ("my app/package.json", r#"{"name": "spaced", "scripts": {"start": "node server.js"}}"#),
            ("my app/server.js", "require('http')\n"),
        ]);

        let commands = commands(&result);
        assert_eq!(commands[0], "cd 'my app' && npm run start");
        assert!(commands.contains(&"cd 'my app' && npm install"));
    }

    #[test]
    fn test_zero_depth_is_reported_as_truncated() {
        let result = profile_with(&[("main.py", "print(1)\n")], AnalysisOptions::default().with_max_depth(0));

        assert_eq!(result.basic_info.file_count, 0);
        assert!(result.basic_info.truncated);
        assert_eq!(result.basic_info.truncation_reason.as_deref(), Some("max_depth"));
    }

    #[test]
    fn test_depth_one_keeps_root_files() {
        let result = profile_with(
            &[("main.py", "print(1)\n"), ("pkg/util.py", "x = 1\n")],
            AnalysisOptions::default().with_max_depth(1),
        );

        assert_eq!(result.basic_info.file_count, 1);
        assert_eq!(result.languages.primary, "python");
        assert_eq!(result.basic_info.truncation_reason.as_deref(), Some("max_depth"));
    }

    #[test]
    fn test_extensionless_scripts_count_by_shebang() {
        let result = profile(&[
            ("bin/deploy", "#!/usr/bin/env bash\nset -eu\necho deploying\n"),
            ("bin/seed", "#!/usr/bin/env python3\nprint('seed')\n"),
            ("LICENSE", "MIT\n"),
        ]);

        let names: Vec<&str> = result.languages.stats.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"shell"));
        assert!(names.contains(&"python"));
        assert_eq!(result.languages.primary, "shell");
    }
}
