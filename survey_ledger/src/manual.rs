/*!

This is the long-form manual for `survey_ledger` and `surveytally`.

## Questions

A survey is a fixed list of questions, numbered from 1. There are two kinds:

* `singleChoice` questions offer a fixed list of options. An answer is the
  identifier of one option; anything else is ignored.
* `freeText` questions start without any choice. Every new answer becomes a
  choice, and a choice disappears when its last supporter changes their mind.

## Identifiers

The identifier of a choice is derived from its text: lowercase, spaces
replaced by hyphens, and the characters `.`, `:`, `?` and `!` removed.

| text            | identifier     |
|-----------------|----------------|
| `Yes!`          | `yes`          |
| `Option A?`     | `option-a`     |
| `I don't know.` | `i-don't-know` |

Two options of the same question cannot share an identifier. Two free-text
answers that share an identifier count as the same answer, shown with the
spelling of the first one.

## Answers

Each voter holds at most one answer per question. Answering again replaces the
previous answer. An empty answer skips the question and keeps any earlier
answer.

## Configuration

`surveytally` reads the survey from a JSON file:

```json
{
  "surveyName": "Class of 2024",
  "resultsPath": "results.json",
  "usersPath": "users.json",
  "questions": [
    { "prompt": "Do you like coffee?", "kind": "singleChoice", "options": ["Yes!", "No."] },
    { "prompt": "Who is the funniest teacher?", "kind": "freeText" }
  ]
}
```

The users file lists the voters allowed to answer:

```json
{
  "anna": { "name": "Anna", "hasVoted": false, "admin": true },
  "bob": { "name": "Bob", "hasVoted": false, "admin": false }
}
```

## Report

`surveytally stats --user anna` prints, for each question, the choices sorted by
number of supporters together with their share of the answers. Choices with
the same number of supporters keep their display order. The summary can also
be written as JSON (`--out`) or CSV (`--csv`), and compared against a
reference summary (`--reference`).

*/
