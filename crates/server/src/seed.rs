#![forbid(unsafe_code)]

use mp_core::{ChallengeId, IdError, MentorId, PathId, TaskId, TaskWrapperId};
use mp_storage::{
    Catalog, ChallengeDefinition, MentorDefinition, PathDefinition, TaskDefinition,
    WrapperDefinition,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug)]
pub(crate) enum SeedError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    InvalidId { field: &'static str, value: String, error: IdError },
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "seed io: {err}"),
            Self::Yaml(err) => write!(f, "seed yaml: {err}"),
            Self::InvalidId {
                field,
                value,
                error,
            } => write!(f, "seed {field} {value:?}: {}", error.message()),
        }
    }
}

impl std::error::Error for SeedError {}

impl From<std::io::Error> for SeedError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for SeedError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    mentors: Vec<SeedMentor>,
    #[serde(default)]
    tasks: Vec<SeedTask>,
    #[serde(default)]
    challenges: Vec<SeedChallenge>,
    #[serde(default)]
    paths: Vec<SeedPath>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedMentor {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedTask {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedChallenge {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    mentor: String,
    wrappers: Vec<SeedWrapper>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedWrapper {
    id: String,
    task: String,
    order: u32,
    #[serde(default)]
    mentor: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedPath {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    gated: bool,
    #[serde(default)]
    challenges: Vec<String>,
}

pub(crate) fn load_seed(path: &Path) -> Result<Catalog, SeedError> {
    let text = std::fs::read_to_string(path)?;
    parse_seed(&text)
}

pub(crate) fn parse_seed(text: &str) -> Result<Catalog, SeedError> {
    let file: SeedFile = serde_yaml::from_str(text)?;

    let tasks = file
        .tasks
        .into_iter()
        .map(|task| {
            Ok(TaskDefinition {
                id: id("task id", task.id, TaskId::try_new)?,
                name: task.name,
                description: task.description,
            })
        })
        .collect::<Result<Vec<_>, SeedError>>()?;

    let mentors = file
        .mentors
        .into_iter()
        .map(|mentor| {
            Ok(MentorDefinition {
                id: id("mentor id", mentor.id, MentorId::try_new)?,
                name: mentor.name,
                description: mentor.description,
                icon: mentor.icon,
            })
        })
        .collect::<Result<Vec<_>, SeedError>>()?;

    let mut challenges = Vec::with_capacity(file.challenges.len());
    for challenge in file.challenges {
        let mut wrappers = Vec::with_capacity(challenge.wrappers.len());
        for wrapper in challenge.wrappers {
            wrappers.push(WrapperDefinition {
                id: id("wrapper id", wrapper.id, TaskWrapperId::try_new)?,
                task_id: id("wrapper task", wrapper.task, TaskId::try_new)?,
                order: wrapper.order,
                mentor_id: wrapper
                    .mentor
                    .map(|raw| id("wrapper mentor", raw, MentorId::try_new))
                    .transpose()?,
                icon: wrapper.icon,
            });
        }
        challenges.push(ChallengeDefinition {
            id: id("challenge id", challenge.id, ChallengeId::try_new)?,
            name: challenge.name,
            description: challenge.description,
            mentor_id: id("challenge mentor", challenge.mentor, MentorId::try_new)?,
            wrappers,
        });
    }

    let mut paths = Vec::with_capacity(file.paths.len());
    for path in file.paths {
        paths.push(PathDefinition {
            id: id("path id", path.id, PathId::try_new)?,
            name: path.name,
            description: path.description,
            gated: path.gated,
            challenges: path
                .challenges
                .into_iter()
                .map(|raw| id("path challenge", raw, ChallengeId::try_new))
                .collect::<Result<Vec<_>, _>>()?,
        });
    }

    Ok(Catalog {
        tasks,
        mentors,
        challenges,
        paths,
    })
}

fn id<T>(
    field: &'static str,
    raw: String,
    parse: fn(String) -> Result<T, IdError>,
) -> Result<T, SeedError> {
    parse(raw.clone()).map_err(|error| SeedError::InvalidId {
        field,
        value: raw,
        error,
    })
}
