use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::model::EmotionModel;

/// Marker scikit-learn stores in `children_left`/`children_right` for leaves.
const LEAF: i64 = -1;

/// One fitted decision tree, as the parallel arrays of scikit-learn's `tree_`.
///
/// `value` holds one row of class counts (or fractions) per node; only leaf
/// rows are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Array1<f64>),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn leaf_distribution(&self, input: ArrayView1<'_, f64>) -> Option<&Array1<f64>> {
        let mut index = 0;
        loop {
            match self.nodes.get(index)? {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if input[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf(distribution) => return Some(distribution),
            }
        }
    }
}

/// Random forest; the decision is the mean of the trees' leaf class distributions.
#[derive(Debug, Clone)]
pub struct ForestModel {
    n_features: usize,
    n_classes: usize,
    trees: Vec<Tree>,
}

impl TryFrom<ForestArtifact> for ForestModel {
    type Error = String;

    fn try_from(artifact: ForestArtifact) -> Result<Self, Self::Error> {
        if artifact.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if artifact.n_features == 0 || artifact.n_classes == 0 {
            return Err("forest needs at least one feature and one class".to_string());
        }
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(index, tree)| {
                build_tree(tree, artifact.n_features, artifact.n_classes)
                    .map_err(|reason| format!("tree {index}: {reason}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            n_features: artifact.n_features,
            n_classes: artifact.n_classes,
            trees,
        })
    }
}

fn build_tree(tree: TreeArtifact, n_features: usize, n_classes: usize) -> Result<Tree, String> {
    let count = tree.children_left.len();
    if count == 0 {
        return Err("tree has no nodes".to_string());
    }
    if [
        tree.children_right.len(),
        tree.feature.len(),
        tree.threshold.len(),
        tree.value.len(),
    ]
    .iter()
    .any(|len| *len != count)
    {
        return Err("node arrays differ in length".to_string());
    }

    let mut nodes = Vec::with_capacity(count);
    for (node, value) in tree.value.into_iter().enumerate() {
        let (left, right) = (tree.children_left[node], tree.children_right[node]);
        if left == LEAF && right == LEAF {
            nodes.push(Node::Leaf(leaf_distribution(node, value, n_classes)?));
            continue;
        }
        // children always come after their parent, which also rules out cycles
        let child = |raw: i64| -> Result<usize, String> {
            usize::try_from(raw)
                .ok()
                .filter(|index| *index > node && *index < count)
                .ok_or_else(|| format!("node {node} has out-of-range child {raw}"))
        };
        let (left, right) = (child(left)?, child(right)?);
        let feature = usize::try_from(tree.feature[node])
            .ok()
            .filter(|feature| *feature < n_features)
            .ok_or_else(|| {
                format!(
                    "node {node} splits on feature {} of {n_features}",
                    tree.feature[node]
                )
            })?;
        let threshold = tree.threshold[node];
        if !threshold.is_finite() {
            return Err(format!("node {node} has a non-finite threshold"));
        }
        nodes.push(Node::Split {
            feature,
            threshold,
            left,
            right,
        });
    }
    Ok(Tree { nodes })
}

fn leaf_distribution(node: usize, value: Vec<f64>, n_classes: usize) -> Result<Array1<f64>, String> {
    if value.len() != n_classes {
        return Err(format!(
            "leaf {node} has {} class values, expected {n_classes}",
            value.len()
        ));
    }
    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(format!("leaf {node} has negative or non-finite values"));
    }
    let total: f64 = value.iter().sum();
    if total <= 0.0 {
        return Err(format!("leaf {node} holds no samples"));
    }
    Ok(Array1::from(value) / total)
}

impl EmotionModel for ForestModel {
    fn input_dim(&self) -> usize {
        self.n_features
    }

    fn class_count(&self) -> usize {
        self.n_classes
    }

    fn decision(&self, input: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut votes = Array1::zeros(self.n_classes);
        if input.len() < self.n_features {
            return votes;
        }
        for tree in &self.trees {
            if let Some(distribution) = tree.leaf_distribution(input) {
                votes += distribution;
            }
        }
        votes / self.trees.len() as f64
    }

    fn probabilities(&self, scores: &Array1<f64>) -> Array1<f64> {
        scores.clone()
    }
}
